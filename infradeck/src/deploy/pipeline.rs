//! Operation pipeline: resolve target, track the deployment, run, report

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::deploy::output::RunOutput;
use crate::deploy::process::ProcessRunner;
use crate::deploy::strategy::ansible::{LocalAnsible, SimulatedAnsible};
use crate::deploy::strategy::terraform::{LocalTerraform, SimulatedTerraform};
use crate::deploy::strategy::{
    ExecutionMode, ExecutionStrategy, OperationFamily, OperationTarget, ResourceChange,
    StrategyTable,
};
use crate::deploy::tracker::DeploymentTracker;
use crate::deploy::workspace::WorkspaceManager;
use crate::errors::DeckError;
use crate::hub::messages::ServerEvent;
use crate::hub::registry::{ClientId, ClientRegistry};
use crate::models::deployment::{Deployment, DeploymentStatus};
use crate::storage::provider::Storage;
use crate::storage::settings::ExecutorSettings;

/// A request to run one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRequest {
    pub family: OperationFamily,
    pub target_id: u64,
    pub mode: ExecutionMode,
}

/// The four built-in strategies
pub fn standard_strategies(
    workspaces: Arc<WorkspaceManager>,
    runner: Arc<ProcessRunner>,
    executor: &ExecutorSettings,
) -> StrategyTable {
    let mut table = StrategyTable::new();
    table
        .register(Arc::new(LocalTerraform::new(
            workspaces.clone(),
            runner.clone(),
            executor.terraform_stages.clone(),
        )))
        .register(Arc::new(LocalAnsible::new(
            workspaces,
            runner,
            executor.ansible_stages.clone(),
        )))
        .register(Arc::new(SimulatedTerraform::new()))
        .register(Arc::new(SimulatedAnsible::new()));
    table
}

pub struct Pipeline {
    storage: Arc<dyn Storage>,
    tracker: Arc<DeploymentTracker>,
    clients: Arc<ClientRegistry>,
    strategies: StrategyTable,
    run_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        tracker: Arc<DeploymentTracker>,
        clients: Arc<ClientRegistry>,
        strategies: StrategyTable,
    ) -> Self {
        Self {
            storage,
            tracker,
            clients,
            strategies,
            run_timeout: None,
        }
    }

    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn tracker(&self) -> &Arc<DeploymentTracker> {
        &self.tracker
    }

    /// Run `request` to completion on behalf of `origin`.
    ///
    /// Errors before the deployment exists (unknown target, unsupported
    /// mode) are returned without any broadcast. Once it exists, run
    /// failures are recorded on it and broadcast, and the final deployment
    /// is returned; only a failure to store the final record is an error.
    pub async fn launch(
        &self,
        request: OperationRequest,
        origin: &ClientId,
    ) -> Result<Deployment, DeckError> {
        let strategy = self
            .strategies
            .get(request.family, request.mode)
            .ok_or_else(|| {
                DeckError::ProtocolError(format!(
                    "no {:?} strategy for {}",
                    request.mode,
                    request.family.label()
                ))
            })?;

        let target = self.resolve(request).await?;
        let deployment = self
            .tracker
            .create(&strategy.deployment_name(&target), strategy.initial_logs())
            .await?;
        info!(
            "Deployment {} started: {} ({:?})",
            deployment.id, deployment.name, request.mode
        );
        self.clients
            .broadcast(&ServerEvent::DeploymentStarted { deployment: deployment.clone() });

        let mut output = RunOutput::new(
            request.family,
            target.id(),
            deployment.id,
            origin.clone(),
            strategy.delivery(),
            strategy.initial_logs(),
            self.tracker.clone(),
            self.clients.clone(),
        );
        let result = self.execute(strategy.as_ref(), &target, &mut output).await;
        let logs = output.logs().to_string();

        self.finish(strategy.as_ref(), &target, deployment, logs, result)
            .await
    }

    /// Look up the target; Ansible runs stamp the playbook's last run here
    async fn resolve(&self, request: OperationRequest) -> Result<OperationTarget, DeckError> {
        let target = match request.family {
            OperationFamily::Terraform => self
                .storage
                .get_terraform_config(request.target_id)
                .await?
                .map(OperationTarget::Terraform),
            OperationFamily::Ansible => self
                .storage
                .touch_ansible_playbook_last_run(request.target_id)
                .await?
                .map(OperationTarget::Ansible),
        };
        target.ok_or_else(|| DeckError::NotFound(request.family.not_found_message().to_string()))
    }

    async fn execute(
        &self,
        strategy: &dyn ExecutionStrategy,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError> {
        match self.run_timeout {
            Some(limit) => tokio::time::timeout(limit, strategy.execute(target, output))
                .await
                .unwrap_or(Err(DeckError::Timeout(limit))),
            None => strategy.execute(target, output).await,
        }
    }

    /// Settle the deployment and tell every client how the run ended.
    ///
    /// `deployment_completed` is broadcast even when the final record could
    /// not be stored; the error is returned after all events are sent.
    async fn finish(
        &self,
        strategy: &dyn ExecutionStrategy,
        target: &OperationTarget,
        started: Deployment,
        logs: String,
        result: Result<String, DeckError>,
    ) -> Result<Deployment, DeckError> {
        let status = match &result {
            Ok(_) => DeploymentStatus::Completed,
            Err(_) => DeploymentStatus::Failed,
        };
        let (deployment, recorded) = match self.tracker.complete(started.id, status).await {
            Ok(deployment) => (deployment, Ok(())),
            Err(e) => {
                error!("Deployment {}: failed to record completion: {}", started.id, e);
                let deployment = Deployment {
                    status,
                    logs,
                    completed_at: Some(Utc::now()),
                    ..started
                };
                (deployment, Err(e))
            }
        };
        info!("Deployment {} {}", deployment.id, deployment.status);
        self.clients
            .broadcast(&ServerEvent::DeploymentCompleted { deployment: deployment.clone() });

        let failure = match result {
            Ok(_) => match strategy.apply_outcome(target, self.storage.as_ref()).await {
                Ok(Some(ResourceChange::Created(resource))) => {
                    self.clients.broadcast(&ServerEvent::ResourceCreated { resource });
                    None
                }
                Ok(Some(ResourceChange::Updated(resource))) => {
                    self.clients.broadcast(&ServerEvent::ResourceUpdated { resource });
                    None
                }
                Ok(None) => None,
                Err(e) => Some(format!(
                    "{}: failed to record outcome: {}",
                    strategy.failure_prefix(),
                    e
                )),
            },
            Err(e) => Some(format!("{}: {}", strategy.failure_prefix(), e)),
        };

        if let Some(message) = failure {
            warn!("Deployment {}: {}", deployment.id, message);
            self.clients
                .broadcast(&ServerEvent::run_error(target.family(), target.id(), message));
        }

        recorded.map(|()| deployment)
    }
}
