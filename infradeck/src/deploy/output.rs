//! Per-run output sink: keeps the deployment logs current and emits output events

use std::sync::Arc;

use crate::deploy::strategy::OperationFamily;
use crate::deploy::tracker::DeploymentTracker;
use crate::errors::DeckError;
use crate::hub::messages::ServerEvent;
use crate::hub::registry::{ClientId, ClientRegistry};
use crate::models::deployment::DeploymentStatus;

/// Who receives output events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Only the client that requested the run
    Origin,

    /// Every connected client
    Broadcast,
}

/// Accumulates a run's logs.
///
/// Each push persists the cumulative logs on the deployment before the output
/// event goes out, so a client never sees logs the store does not have.
pub struct RunOutput {
    family: OperationFamily,
    target_id: u64,
    deployment_id: u64,
    origin: ClientId,
    delivery: Delivery,
    logs: String,
    tracker: Arc<DeploymentTracker>,
    clients: Arc<ClientRegistry>,
}

impl RunOutput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family: OperationFamily,
        target_id: u64,
        deployment_id: u64,
        origin: ClientId,
        delivery: Delivery,
        initial_logs: &str,
        tracker: Arc<DeploymentTracker>,
        clients: Arc<ClientRegistry>,
    ) -> Self {
        Self {
            family,
            target_id,
            deployment_id,
            origin,
            delivery,
            logs: format!("{}\n", initial_logs),
            tracker,
            clients,
        }
    }

    pub fn deployment_id(&self) -> u64 {
        self.deployment_id
    }

    /// Logs accumulated so far
    pub fn logs(&self) -> &str {
        &self.logs
    }

    /// Append a raw chunk of process output
    pub async fn push_chunk(&mut self, chunk: &str) -> Result<(), DeckError> {
        self.logs.push_str(chunk);
        self.publish(chunk).await
    }

    /// Append one line of scripted output
    pub async fn push_line(&mut self, line: &str) -> Result<(), DeckError> {
        self.logs.push_str(line);
        self.logs.push('\n');
        self.publish(line).await
    }

    async fn publish(&self, message: &str) -> Result<(), DeckError> {
        self.tracker
            .update_status(
                self.deployment_id,
                DeploymentStatus::InProgress,
                Some(self.logs.clone()),
            )
            .await?;

        let event = ServerEvent::output(
            self.family,
            self.target_id,
            message,
            self.deployment_id,
            self.logs.clone(),
        );
        match self.delivery {
            Delivery::Origin => {
                self.clients.send_to(&self.origin, &event);
            }
            Delivery::Broadcast => {
                self.clients.broadcast(&event);
            }
        }
        Ok(())
    }
}
