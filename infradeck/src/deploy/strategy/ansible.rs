//! Ansible playbook strategies

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::deploy::output::{Delivery, RunOutput};
use crate::deploy::process::ProcessRunner;
use crate::deploy::strategy::local::run_stages;
use crate::deploy::strategy::scripts::{ScriptStep, ANSIBLE_RUN_SCRIPT};
use crate::deploy::strategy::simulated::play_script;
use crate::deploy::strategy::{
    ExecutionMode, ExecutionStrategy, OperationFamily, OperationTarget, ResourceChange,
};
use crate::deploy::workspace::{WorkspaceKind, WorkspaceManager};
use crate::errors::DeckError;
use crate::models::ansible::AnsiblePlaybook;
use crate::models::resource::NewResource;
use crate::storage::provider::Storage;
use crate::utils::short_id;

/// Inventory written next to every local playbook
pub const LOCAL_INVENTORY: &str = "[local]
localhost ansible_connection=local

[web_servers]
localhost ansible_connection=local

[db_servers]
localhost ansible_connection=local
";

const CONFIGURED: &str = "configured";

fn playbook(target: &OperationTarget) -> Result<&AnsiblePlaybook, DeckError> {
    match target {
        OperationTarget::Ansible(playbook) => Ok(playbook),
        other => Err(DeckError::Internal(format!(
            "ansible strategy given a {} target",
            other.family().label()
        ))),
    }
}

/// Writes the playbook and a localhost inventory, then runs the configured stages
pub struct LocalAnsible {
    workspaces: Arc<WorkspaceManager>,
    runner: Arc<ProcessRunner>,
    stages: Vec<String>,
}

impl LocalAnsible {
    pub fn new(
        workspaces: Arc<WorkspaceManager>,
        runner: Arc<ProcessRunner>,
        stages: Vec<String>,
    ) -> Self {
        Self {
            workspaces,
            runner,
            stages,
        }
    }
}

#[async_trait]
impl ExecutionStrategy for LocalAnsible {
    fn family(&self) -> OperationFamily {
        OperationFamily::Ansible
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Local
    }

    fn delivery(&self) -> Delivery {
        Delivery::Origin
    }

    fn deployment_name(&self, target: &OperationTarget) -> String {
        format!("Ansible run (localhost): {}", target.name())
    }

    fn initial_logs(&self) -> &'static str {
        "Starting local Ansible playbook execution..."
    }

    fn failure_prefix(&self) -> &'static str {
        "Error executing Ansible locally"
    }

    async fn execute(
        &self,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError> {
        let playbook = playbook(target)?;
        let workspace = self
            .workspaces
            .create_workspace(WorkspaceKind::Ansible, playbook.id)
            .await?;

        self.workspaces
            .write_file(&workspace, &playbook.content, "playbook.yml")
            .await?;
        self.workspaces
            .write_file(&workspace, LOCAL_INVENTORY, "inventory")
            .await?;

        info!(
            "Running ansible playbook {} in {}",
            playbook.id,
            workspace.path().display()
        );
        run_stages(&self.runner, &self.stages, workspace.path(), output).await
    }

    /// Marks the first local resource configured, creating one if none exists
    async fn apply_outcome(
        &self,
        target: &OperationTarget,
        storage: &dyn Storage,
    ) -> Result<Option<ResourceChange>, DeckError> {
        let playbook = playbook(target)?;
        let local = storage
            .list_resources()
            .await?
            .into_iter()
            .find(|r| r.resource_type == "local");

        if let Some(existing) = local {
            if let Some(resource) = storage
                .update_resource_status(existing.id, CONFIGURED)
                .await?
            {
                return Ok(Some(ResourceChange::Updated(resource)));
            }
        }

        let resource = storage
            .create_resource(
                NewResource::new("Local Server: localhost", "local", CONFIGURED).with_details(
                    json!({
                        "id": format!("local-{}", short_id(8)),
                        "source": "localhost",
                        "playbookId": playbook.id,
                    }),
                ),
            )
            .await?;
        Ok(Some(ResourceChange::Created(resource)))
    }
}

/// Plays back a canned playbook run against the demo web servers
pub struct SimulatedAnsible {
    script: &'static [ScriptStep],
}

impl SimulatedAnsible {
    pub fn new() -> Self {
        Self::with_script(ANSIBLE_RUN_SCRIPT)
    }

    pub fn with_script(script: &'static [ScriptStep]) -> Self {
        Self { script }
    }
}

impl Default for SimulatedAnsible {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStrategy for SimulatedAnsible {
    fn family(&self) -> OperationFamily {
        OperationFamily::Ansible
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Cloud
    }

    fn delivery(&self) -> Delivery {
        Delivery::Broadcast
    }

    fn deployment_name(&self, target: &OperationTarget) -> String {
        format!("Ansible run: {}", target.name())
    }

    fn initial_logs(&self) -> &'static str {
        "Starting Ansible playbook execution..."
    }

    fn failure_prefix(&self) -> &'static str {
        "Error executing Ansible playbook"
    }

    async fn execute(
        &self,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError> {
        playbook(target)?;
        play_script(self.script, output).await
    }

    async fn apply_outcome(
        &self,
        _target: &OperationTarget,
        storage: &dyn Storage,
    ) -> Result<Option<ResourceChange>, DeckError> {
        let web2 = storage
            .list_resources()
            .await?
            .into_iter()
            .find(|r| r.name == "Web Server 2");

        let Some(web2) = web2 else {
            return Ok(None);
        };
        Ok(storage
            .update_resource_status(web2.id, "healthy")
            .await?
            .map(ResourceChange::Updated))
    }
}
