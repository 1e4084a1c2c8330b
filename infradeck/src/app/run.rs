//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::DeckError;
use crate::server::serve::serve;
use crate::workers::janitor;

/// Run the infradeck server until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeckError> {
    info!("Initializing infradeck...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager =
        ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start infradeck: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), DeckError> {
    let app_state = Arc::new(AppState::init(options).await?);
    shutdown_manager.with_app_state(app_state.clone())?;

    init_server(options, app_state.clone(), shutdown_manager, shutdown_tx.subscribe()).await?;

    if let Some(janitor_options) = options.janitor.clone() {
        init_janitor_worker(
            janitor_options,
            app_state,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    Ok(())
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeckError> {
    info!("Initializing HTTP server...");

    let (server_handle, addr) = serve(
        &options.server,
        Arc::new(app_state.server_state()),
        async move {
            let _ = shutdown_rx.recv().await;
        },
    )
    .await?;
    info!("Realtime endpoint at ws://{}/ws", addr);

    shutdown_manager.with_server_handle(server_handle)
}

fn init_janitor_worker(
    options: janitor::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeckError> {
    info!("Initializing janitor worker...");

    let workspaces = app_state.workspaces.clone();
    let janitor_handle = tokio::spawn(async move {
        janitor::run(
            &options,
            workspaces.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_janitor_worker_handle(janitor_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    server_handle: Option<JoinHandle<Result<(), DeckError>>>,
    janitor_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            server_handle: None,
            janitor_worker_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), DeckError> {
        if self.app_state.is_some() {
            return Err(DeckError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), DeckError>>,
    ) -> Result<(), DeckError> {
        if self.server_handle.is_some() {
            return Err(DeckError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub fn with_janitor_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), DeckError> {
        if self.janitor_worker_handle.is_some() {
            return Err(DeckError::ShutdownError("janitor_handle already set".to_string()));
        }
        self.janitor_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), DeckError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DeckError> {
        info!("Shutting down infradeck...");

        // 1. Janitor worker
        if let Some(handle) = self.janitor_worker_handle.take() {
            handle
                .await
                .map_err(|e| DeckError::ShutdownError(e.to_string()))?;
        }

        // 2. Server
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| DeckError::ShutdownError(e.to_string()))??;
        }

        // 3. App state
        if let Some(state) = self.app_state.take() {
            state.shutdown().await?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
