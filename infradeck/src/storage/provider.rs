//! Storage provider contract
//!
//! Every getter and updater returns `Ok(None)` when the id is unknown; errors
//! are reserved for backend failures.

use async_trait::async_trait;

use crate::errors::DeckError;
use crate::models::ansible::{AnsiblePlaybook, AnsiblePlaybookPatch, NewAnsiblePlaybook};
use crate::models::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::models::resource::{NewResource, Resource};
use crate::models::template::{InfraTemplate, NewInfraTemplate};
use crate::models::terraform::{NewTerraformConfig, TerraformConfig, TerraformConfigPatch};

#[async_trait]
pub trait Storage: Send + Sync {
    // Resources
    async fn list_resources(&self) -> Result<Vec<Resource>, DeckError>;
    async fn get_resource(&self, id: u64) -> Result<Option<Resource>, DeckError>;
    async fn create_resource(&self, resource: NewResource) -> Result<Resource, DeckError>;
    async fn update_resource_status(
        &self,
        id: u64,
        status: &str,
    ) -> Result<Option<Resource>, DeckError>;

    // Terraform configurations
    async fn list_terraform_configs(&self) -> Result<Vec<TerraformConfig>, DeckError>;
    async fn get_terraform_config(&self, id: u64) -> Result<Option<TerraformConfig>, DeckError>;
    async fn create_terraform_config(
        &self,
        config: NewTerraformConfig,
    ) -> Result<TerraformConfig, DeckError>;
    async fn update_terraform_config(
        &self,
        id: u64,
        patch: TerraformConfigPatch,
    ) -> Result<Option<TerraformConfig>, DeckError>;

    // Ansible playbooks
    async fn list_ansible_playbooks(&self) -> Result<Vec<AnsiblePlaybook>, DeckError>;
    async fn get_ansible_playbook(&self, id: u64) -> Result<Option<AnsiblePlaybook>, DeckError>;
    async fn create_ansible_playbook(
        &self,
        playbook: NewAnsiblePlaybook,
    ) -> Result<AnsiblePlaybook, DeckError>;
    async fn update_ansible_playbook(
        &self,
        id: u64,
        patch: AnsiblePlaybookPatch,
    ) -> Result<Option<AnsiblePlaybook>, DeckError>;
    async fn touch_ansible_playbook_last_run(
        &self,
        id: u64,
    ) -> Result<Option<AnsiblePlaybook>, DeckError>;

    // Infrastructure templates
    async fn list_templates(&self) -> Result<Vec<InfraTemplate>, DeckError>;
    async fn get_template(&self, id: u64) -> Result<Option<InfraTemplate>, DeckError>;
    async fn create_template(&self, template: NewInfraTemplate) -> Result<InfraTemplate, DeckError>;

    // Deployments
    async fn list_deployments(&self) -> Result<Vec<Deployment>, DeckError>;
    async fn get_deployment(&self, id: u64) -> Result<Option<Deployment>, DeckError>;
    async fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment, DeckError>;

    /// Set status; `logs`, when given, replaces the stored logs wholesale
    async fn update_deployment_status(
        &self,
        id: u64,
        status: DeploymentStatus,
        logs: Option<String>,
    ) -> Result<Option<Deployment>, DeckError>;

    /// Set the final status and stamp `completed_at`
    async fn complete_deployment(
        &self,
        id: u64,
        status: DeploymentStatus,
    ) -> Result<Option<Deployment>, DeckError>;
}
