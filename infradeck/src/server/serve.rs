//! HTTP server setup

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::DeckError;
use crate::hub::socket::ws_handler;
use crate::server::api;
use crate::server::handlers::{health_handler, version_handler};
use crate::server::state::ServerState;

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Realtime
        .route("/ws", get(ws_handler))
        // Resources
        .route(
            "/api/resources",
            get(api::list_resources).post(api::create_resource),
        )
        .route("/api/resources/{id}/status", put(api::update_resource_status))
        // Terraform
        .route(
            "/api/terraform",
            get(api::list_terraform_configs).post(api::create_terraform_config),
        )
        .route(
            "/api/terraform/{id}",
            get(api::get_terraform_config).put(api::update_terraform_config),
        )
        // Ansible
        .route(
            "/api/ansible",
            get(api::list_ansible_playbooks).post(api::create_ansible_playbook),
        )
        .route(
            "/api/ansible/{id}",
            get(api::get_ansible_playbook).put(api::update_ansible_playbook),
        )
        // Templates
        .route(
            "/api/templates",
            get(api::list_templates).post(api::create_template),
        )
        .route("/api/templates/{id}", get(api::get_template))
        // Deployments
        .route("/api/deployments", get(api::list_deployments))
        .route("/api/deployments/{id}", get(api::get_deployment))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Start the HTTP server.
///
/// Returns the server task and the bound address (useful with port 0).
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(JoinHandle<Result<(), DeckError>>, SocketAddr), DeckError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DeckError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| DeckError::ServerError(e.to_string()))?;
    info!("HTTP server listening on {}", local_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| DeckError::ServerError(e.to_string()))
    });

    Ok((handle, local_addr))
}
