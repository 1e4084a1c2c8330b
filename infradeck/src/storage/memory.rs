//! In-memory storage provider

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::DeckError;
use crate::models::ansible::{AnsiblePlaybook, AnsiblePlaybookPatch, NewAnsiblePlaybook};
use crate::models::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::models::resource::{NewResource, Resource};
use crate::models::template::{InfraTemplate, NewInfraTemplate};
use crate::models::terraform::{NewTerraformConfig, TerraformConfig, TerraformConfigPatch};
use crate::storage::provider::Storage;

/// One id-keyed table with its own id sequence
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn update(&mut self, id: u64, apply: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id)?;
        apply(row);
        Some(row.clone())
    }

    fn get(&self, id: u64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

/// Storage provider keeping every table in process memory.
///
/// Each table sits behind its own lock, so concurrent runs touching
/// deployments never wait on resource updates and vice versa.
pub struct MemStorage {
    resources: RwLock<Table<Resource>>,
    terraform_configs: RwLock<Table<TerraformConfig>>,
    ansible_playbooks: RwLock<Table<AnsiblePlaybook>>,
    templates: RwLock<Table<InfraTemplate>>,
    deployments: RwLock<Table<Deployment>>,
}

impl MemStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(Table::new()),
            terraform_configs: RwLock::new(Table::new()),
            ansible_playbooks: RwLock::new(Table::new()),
            templates: RwLock::new(Table::new()),
            deployments: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn list_resources(&self) -> Result<Vec<Resource>, DeckError> {
        Ok(self.resources.read().await.all())
    }

    async fn get_resource(&self, id: u64) -> Result<Option<Resource>, DeckError> {
        Ok(self.resources.read().await.get(id))
    }

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, DeckError> {
        let mut table = self.resources.write().await;
        Ok(table.insert_with(|id| Resource {
            id,
            name: resource.name,
            resource_type: resource.resource_type,
            status: resource.status,
            details: resource.details,
            created_at: Utc::now(),
        }))
    }

    async fn update_resource_status(
        &self,
        id: u64,
        status: &str,
    ) -> Result<Option<Resource>, DeckError> {
        let mut table = self.resources.write().await;
        Ok(table.update(id, |resource| resource.status = status.to_string()))
    }

    async fn list_terraform_configs(&self) -> Result<Vec<TerraformConfig>, DeckError> {
        Ok(self.terraform_configs.read().await.all())
    }

    async fn get_terraform_config(&self, id: u64) -> Result<Option<TerraformConfig>, DeckError> {
        Ok(self.terraform_configs.read().await.get(id))
    }

    async fn create_terraform_config(
        &self,
        config: NewTerraformConfig,
    ) -> Result<TerraformConfig, DeckError> {
        let mut table = self.terraform_configs.write().await;
        Ok(table.insert_with(|id| TerraformConfig {
            id,
            name: config.name,
            content: config.content,
            variables: config.variables,
            created_at: Utc::now(),
        }))
    }

    async fn update_terraform_config(
        &self,
        id: u64,
        patch: TerraformConfigPatch,
    ) -> Result<Option<TerraformConfig>, DeckError> {
        let mut table = self.terraform_configs.write().await;
        Ok(table.update(id, |config| {
            if let Some(name) = patch.name {
                config.name = name;
            }
            if let Some(content) = patch.content {
                config.content = content;
            }
            if let Some(variables) = patch.variables {
                config.variables = Some(variables);
            }
        }))
    }

    async fn list_ansible_playbooks(&self) -> Result<Vec<AnsiblePlaybook>, DeckError> {
        Ok(self.ansible_playbooks.read().await.all())
    }

    async fn get_ansible_playbook(&self, id: u64) -> Result<Option<AnsiblePlaybook>, DeckError> {
        Ok(self.ansible_playbooks.read().await.get(id))
    }

    async fn create_ansible_playbook(
        &self,
        playbook: NewAnsiblePlaybook,
    ) -> Result<AnsiblePlaybook, DeckError> {
        let mut table = self.ansible_playbooks.write().await;
        Ok(table.insert_with(|id| AnsiblePlaybook {
            id,
            name: playbook.name,
            content: playbook.content,
            last_run: None,
            created_at: Utc::now(),
        }))
    }

    async fn update_ansible_playbook(
        &self,
        id: u64,
        patch: AnsiblePlaybookPatch,
    ) -> Result<Option<AnsiblePlaybook>, DeckError> {
        let mut table = self.ansible_playbooks.write().await;
        Ok(table.update(id, |playbook| {
            if let Some(name) = patch.name {
                playbook.name = name;
            }
            if let Some(content) = patch.content {
                playbook.content = content;
            }
        }))
    }

    async fn touch_ansible_playbook_last_run(
        &self,
        id: u64,
    ) -> Result<Option<AnsiblePlaybook>, DeckError> {
        let mut table = self.ansible_playbooks.write().await;
        Ok(table.update(id, |playbook| playbook.last_run = Some(Utc::now())))
    }

    async fn list_templates(&self) -> Result<Vec<InfraTemplate>, DeckError> {
        Ok(self.templates.read().await.all())
    }

    async fn get_template(&self, id: u64) -> Result<Option<InfraTemplate>, DeckError> {
        Ok(self.templates.read().await.get(id))
    }

    async fn create_template(&self, template: NewInfraTemplate) -> Result<InfraTemplate, DeckError> {
        let mut table = self.templates.write().await;
        let now = Utc::now();
        Ok(table.insert_with(|id| InfraTemplate {
            id,
            name: template.name,
            description: template.description,
            provider: template.provider,
            content: template.content,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, DeckError> {
        Ok(self.deployments.read().await.all())
    }

    async fn get_deployment(&self, id: u64) -> Result<Option<Deployment>, DeckError> {
        Ok(self.deployments.read().await.get(id))
    }

    async fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment, DeckError> {
        let mut table = self.deployments.write().await;
        Ok(table.insert_with(|id| Deployment {
            id,
            name: deployment.name,
            status: deployment.status,
            logs: deployment.logs,
            started_at: Utc::now(),
            completed_at: None,
        }))
    }

    async fn update_deployment_status(
        &self,
        id: u64,
        status: DeploymentStatus,
        logs: Option<String>,
    ) -> Result<Option<Deployment>, DeckError> {
        let mut table = self.deployments.write().await;
        Ok(table.update(id, |deployment| {
            deployment.status = status;
            if let Some(logs) = logs {
                deployment.logs = logs;
            }
        }))
    }

    async fn complete_deployment(
        &self,
        id: u64,
        status: DeploymentStatus,
    ) -> Result<Option<Deployment>, DeckError> {
        let mut table = self.deployments.write().await;
        Ok(table.update(id, |deployment| {
            deployment.status = status;
            deployment.completed_at = Some(Utc::now());
        }))
    }
}
