//! REST collaborator over the storage provider
//!
//! Mutations are echoed to realtime clients through the hub.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::errors::DeckError;
use crate::hub::messages::ServerEvent;
use crate::models::ansible::{AnsiblePlaybookPatch, NewAnsiblePlaybook};
use crate::models::resource::NewResource;
use crate::models::template::NewInfraTemplate;
use crate::models::terraform::{NewTerraformConfig, TerraformConfigPatch};
use crate::server::state::ServerState;

/// Error response body in the shape clients expect
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        message: String,
        errors: Vec<String>,
    },
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { message, errors } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": message, "errors": errors })),
            )
                .into_response(),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response(),
        }
    }
}

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        match err {
            DeckError::NotFound(message) => ApiError::NotFound(message),
            DeckError::ValidationError(errors) => ApiError::BadRequest {
                message: "Invalid request".to_string(),
                errors,
            },
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            message: "Invalid request body".to_string(),
            errors: vec![rejection.body_text()],
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn check(errors: Vec<String>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DeckError::ValidationError(errors).into())
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::NotFound(format!("{} not found", what))
}

// ================================ RESOURCES ===================================== //

pub async fn list_resources(State(state): State<Arc<ServerState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.storage.list_resources().await?))
}

pub async fn create_resource(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<NewResource>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = body?;
    check(new.validate())?;

    let resource = state.storage.create_resource(new).await?;
    state.hub.broadcast(&ServerEvent::ResourceCreated {
        resource: resource.clone(),
    });
    Ok((StatusCode::CREATED, Json(resource)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn update_resource_status(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(update) = body?;
    let status = update
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest {
            message: "Status is required".to_string(),
            errors: vec!["status: required".to_string()],
        })?;

    let resource = state
        .storage
        .update_resource_status(id, &status)
        .await?
        .ok_or_else(|| not_found("Resource"))?;
    state.hub.broadcast(&ServerEvent::ResourceUpdated {
        resource: resource.clone(),
    });
    Ok(Json(resource))
}

// ================================ TERRAFORM ===================================== //

pub async fn list_terraform_configs(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.storage.list_terraform_configs().await?))
}

pub async fn get_terraform_config(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let config = state
        .storage
        .get_terraform_config(id)
        .await?
        .ok_or_else(|| not_found("Terraform configuration"))?;
    Ok(Json(config))
}

pub async fn create_terraform_config(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<NewTerraformConfig>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = body?;
    check(new.validate())?;

    let config = state.storage.create_terraform_config(new).await?;
    state.hub.broadcast(&ServerEvent::TerraformConfigCreated {
        config: config.clone(),
    });
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn update_terraform_config(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
    body: Result<Json<TerraformConfigPatch>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(patch) = body?;
    let config = state
        .storage
        .update_terraform_config(id, patch)
        .await?
        .ok_or_else(|| not_found("Terraform configuration"))?;
    state.hub.broadcast(&ServerEvent::TerraformConfigUpdated {
        config: config.clone(),
    });
    Ok(Json(config))
}

// ================================= ANSIBLE ====================================== //

pub async fn list_ansible_playbooks(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.storage.list_ansible_playbooks().await?))
}

pub async fn get_ansible_playbook(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let playbook = state
        .storage
        .get_ansible_playbook(id)
        .await?
        .ok_or_else(|| not_found("Ansible playbook"))?;
    Ok(Json(playbook))
}

pub async fn create_ansible_playbook(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<NewAnsiblePlaybook>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = body?;
    check(new.validate())?;

    let playbook = state.storage.create_ansible_playbook(new).await?;
    state.hub.broadcast(&ServerEvent::AnsiblePlaybookCreated {
        playbook: playbook.clone(),
    });
    Ok((StatusCode::CREATED, Json(playbook)))
}

pub async fn update_ansible_playbook(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
    body: Result<Json<AnsiblePlaybookPatch>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(patch) = body?;
    let playbook = state
        .storage
        .update_ansible_playbook(id, patch)
        .await?
        .ok_or_else(|| not_found("Ansible playbook"))?;
    state.hub.broadcast(&ServerEvent::AnsiblePlaybookUpdated {
        playbook: playbook.clone(),
    });
    Ok(Json(playbook))
}

// ================================ TEMPLATES ===================================== //

pub async fn list_templates(State(state): State<Arc<ServerState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.storage.list_templates().await?))
}

pub async fn get_template(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let template = state
        .storage
        .get_template(id)
        .await?
        .ok_or_else(|| not_found("Template"))?;
    Ok(Json(template))
}

pub async fn create_template(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<NewInfraTemplate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = body?;
    check(new.validate())?;

    let template = state.storage.create_template(new).await?;
    state.hub.broadcast(&ServerEvent::TemplateCreated {
        template: template.clone(),
    });
    Ok((StatusCode::CREATED, Json(template)))
}

// =============================== DEPLOYMENTS ==================================== //

pub async fn list_deployments(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.storage.list_deployments().await?))
}

pub async fn get_deployment(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let deployment = state
        .storage
        .get_deployment(id)
        .await?
        .ok_or_else(|| not_found("Deployment"))?;
    Ok(Json(deployment))
}
