//! Deployment record lifecycle on top of storage

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use crate::errors::DeckError;
use crate::models::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::storage::provider::Storage;

/// Creates, updates and completes deployment records.
///
/// Mutations are serialized so the transition check and the write happen
/// against the same stored state. Once a record reaches a terminal status
/// further updates leave it unchanged.
pub struct DeploymentTracker {
    storage: Arc<dyn Storage>,
    lock: Mutex<()>,
}

impl DeploymentTracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Create an in-progress deployment
    pub async fn create(&self, name: &str, initial_logs: &str) -> Result<Deployment, DeckError> {
        let deployment = self
            .storage
            .create_deployment(NewDeployment {
                name: name.to_string(),
                status: DeploymentStatus::InProgress,
                logs: initial_logs.to_string(),
            })
            .await?;
        debug!("Deployment {} started: {}", deployment.id, deployment.name);
        Ok(deployment)
    }

    pub async fn get(&self, id: u64) -> Result<Deployment, DeckError> {
        self.storage
            .get_deployment(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Set a non-final status; `logs` replaces the stored logs when given
    pub async fn update_status(
        &self,
        id: u64,
        status: DeploymentStatus,
        logs: Option<String>,
    ) -> Result<Deployment, DeckError> {
        if status.is_terminal() {
            return Err(DeckError::InvalidTransition(format!(
                "deployment {}: use complete() to set {}",
                id, status
            )));
        }

        let _guard = self.lock.lock().await;
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            warn!(
                "Ignoring update of deployment {}: already {}",
                id, current.status
            );
            return Ok(current);
        }

        check_transition(&current, status)?;
        self.storage
            .update_deployment_status(id, status, logs)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Set the final status and stamp the completion time.
    ///
    /// Completing an already final deployment returns it unchanged.
    pub async fn complete(&self, id: u64, status: DeploymentStatus) -> Result<Deployment, DeckError> {
        if !status.is_terminal() {
            return Err(DeckError::InvalidTransition(format!(
                "deployment {}: {} is not a final status",
                id, status
            )));
        }

        let _guard = self.lock.lock().await;
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            debug!("Deployment {} already {}", id, current.status);
            return Ok(current);
        }

        check_transition(&current, status)?;
        let deployment = self
            .storage
            .complete_deployment(id, status)
            .await?
            .ok_or_else(|| not_found(id))?;
        debug!("Deployment {} finished: {}", id, deployment.status);
        Ok(deployment)
    }
}

fn check_transition(current: &Deployment, status: DeploymentStatus) -> Result<(), DeckError> {
    let event = DeploymentEvent::towards(current.status, status).ok_or_else(|| {
        DeckError::InvalidTransition(format!(
            "deployment {}: {} -> {}",
            current.id, current.status, status
        ))
    })?;
    DeploymentFsm::from_status(current.status)
        .process(event)
        .map_err(DeckError::InvalidTransition)
}

fn not_found(id: u64) -> DeckError {
    DeckError::NotFound(format!("Deployment {}", id))
}
