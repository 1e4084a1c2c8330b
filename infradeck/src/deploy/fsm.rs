//! Deployment lifecycle state machine

use crate::models::deployment::DeploymentStatus;

/// Deployment event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    /// Execution started
    Start,

    /// More output arrived
    Progress,

    /// Execution finished successfully
    Complete,

    /// Execution failed
    Fail,
}

impl DeploymentEvent {
    /// Event that moves a deployment towards `status`
    pub fn towards(current: DeploymentStatus, status: DeploymentStatus) -> Option<Self> {
        match (current, status) {
            (DeploymentStatus::Pending, DeploymentStatus::InProgress) => Some(DeploymentEvent::Start),
            (DeploymentStatus::InProgress, DeploymentStatus::InProgress) => {
                Some(DeploymentEvent::Progress)
            }
            (_, DeploymentStatus::Completed) => Some(DeploymentEvent::Complete),
            (_, DeploymentStatus::Failed) => Some(DeploymentEvent::Fail),
            _ => None,
        }
    }
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentStatus,
}

impl DeploymentFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self::from_status(DeploymentStatus::Pending)
    }

    /// Resume from a stored status
    pub fn from_status(state: DeploymentStatus) -> Self {
        Self { state }
    }

    /// Get current state
    pub fn state(&self) -> DeploymentStatus {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // From Pending
            (DeploymentStatus::Pending, DeploymentEvent::Start) => DeploymentStatus::InProgress,
            (DeploymentStatus::Pending, DeploymentEvent::Fail) => DeploymentStatus::Failed,

            // From InProgress
            (DeploymentStatus::InProgress, DeploymentEvent::Progress) => {
                DeploymentStatus::InProgress
            }
            (DeploymentStatus::InProgress, DeploymentEvent::Complete) => {
                DeploymentStatus::Completed
            }
            (DeploymentStatus::InProgress, DeploymentEvent::Fail) => DeploymentStatus::Failed,

            // Completed and Failed are final
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
