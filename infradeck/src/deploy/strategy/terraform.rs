//! Terraform apply strategies

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::deploy::output::{Delivery, RunOutput};
use crate::deploy::process::ProcessRunner;
use crate::deploy::strategy::local::run_stages;
use crate::deploy::strategy::scripts::{ScriptStep, TERRAFORM_APPLY_SCRIPT};
use crate::deploy::strategy::simulated::play_script;
use crate::deploy::strategy::{
    ExecutionMode, ExecutionStrategy, OperationFamily, OperationTarget, ResourceChange,
};
use crate::deploy::tfvars::render_tfvars;
use crate::deploy::workspace::{WorkspaceKind, WorkspaceManager};
use crate::errors::DeckError;
use crate::models::resource::NewResource;
use crate::models::terraform::TerraformConfig;
use crate::storage::provider::Storage;
use crate::utils::short_id;

const DEFAULT_REGION: &str = "us-west-2";

fn config(target: &OperationTarget) -> Result<&TerraformConfig, DeckError> {
    match target {
        OperationTarget::Terraform(config) => Ok(config),
        other => Err(DeckError::Internal(format!(
            "terraform strategy given a {} target",
            other.family().label()
        ))),
    }
}

/// Writes the configuration into a workspace and runs the configured stages
pub struct LocalTerraform {
    workspaces: Arc<WorkspaceManager>,
    runner: Arc<ProcessRunner>,
    stages: Vec<String>,
}

impl LocalTerraform {
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
impl ExecutionStrategy for LocalTerraform {
    fn family(&self) -> OperationFamily {
        OperationFamily::Terraform
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Local
    }

    fn delivery(&self) -> Delivery {
        Delivery::Origin
    }

    fn deployment_name(&self, target: &OperationTarget) -> String {
        format!("Terraform apply (localhost): {}", target.name())
    }

    fn initial_logs(&self) -> &'static str {
        "Starting local Terraform execution..."
    }

    fn failure_prefix(&self) -> &'static str {
        "Error executing Terraform locally"
    }

    async fn execute(
        &self,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError> {
        let config = config(target)?;
        let workspace = self
            .workspaces
            .create_workspace(WorkspaceKind::Terraform, config.id)
            .await?;

        self.workspaces
            .write_file(&workspace, &config.content, "main.tf")
            .await?;
        if let Some(variables) = config.variables.as_ref().filter(|v| !v.is_empty()) {
            self.workspaces
                .write_file(&workspace, &render_tfvars(variables), "terraform.tfvars")
                .await?;
        }

        info!(
            "Applying terraform config {} in {}",
            config.id,
            workspace.path().display()
        );
        run_stages(&self.runner, &self.stages, workspace.path(), output).await
    }

    async fn apply_outcome(
        &self,
        target: &OperationTarget,
        storage: &dyn Storage,
    ) -> Result<Option<ResourceChange>, DeckError> {
        let config = config(target)?;
        let resource = storage
            .create_resource(
                NewResource::new(
                    format!("Local Terraform Resource: {}", config.name),
                    "local",
                    "healthy",
                )
                .with_details(json!({
                    "id": format!("local-{}", short_id(8)),
                    "source": "localhost",
                    "configId": config.id,
                })),
            )
            .await?;
        Ok(Some(ResourceChange::Created(resource)))
    }
}

/// Plays back a canned apply and creates a VPC resource
pub struct SimulatedTerraform {
    script: &'static [ScriptStep],
}

impl SimulatedTerraform {
    pub fn new() -> Self {
        Self::with_script(TERRAFORM_APPLY_SCRIPT)
    }

    pub fn with_script(script: &'static [ScriptStep]) -> Self {
        Self { script }
    }
}

impl Default for SimulatedTerraform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStrategy for SimulatedTerraform {
    fn family(&self) -> OperationFamily {
        OperationFamily::Terraform
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Cloud
    }

    fn delivery(&self) -> Delivery {
        Delivery::Broadcast
    }

    fn deployment_name(&self, target: &OperationTarget) -> String {
        format!("Terraform apply: {}", target.name())
    }

    fn initial_logs(&self) -> &'static str {
        "Initializing..."
    }

    fn failure_prefix(&self) -> &'static str {
        "Error applying Terraform configuration"
    }

    async fn execute(
        &self,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError> {
        config(target)?;
        play_script(self.script, output).await
    }

    async fn apply_outcome(
        &self,
        target: &OperationTarget,
        storage: &dyn Storage,
    ) -> Result<Option<ResourceChange>, DeckError> {
        let config = config(target)?;
        let region = config.string_variable("aws_region").unwrap_or(DEFAULT_REGION);
        let resource = storage
            .create_resource(
                NewResource::new("New VPC Resource", "network", "healthy").with_details(json!({
                    "id": format!("vpc-{}", short_id(8)),
                    "region": region,
                })),
            )
            .await?;
        Ok(Some(ResourceChange::Created(resource)))
    }
}
