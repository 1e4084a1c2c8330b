//! Wire messages exchanged with realtime clients

use serde::{Deserialize, Deserializer, Serialize};

use crate::deploy::pipeline::OperationRequest;
use crate::deploy::strategy::{ExecutionMode, OperationFamily};
use crate::models::ansible::AnsiblePlaybook;
use crate::models::deployment::Deployment;
use crate::models::resource::Resource;
use crate::models::template::InfraTemplate;
use crate::models::terraform::TerraformConfig;

/// Inbound messages, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    TerraformApply {
        config_id: u64,
        #[serde(default, deserialize_with = "lenient_mode")]
        execution_mode: Option<ExecutionMode>,
    },

    #[serde(rename_all = "camelCase")]
    AnsibleRun {
        playbook_id: u64,
        #[serde(default, deserialize_with = "lenient_mode")]
        execution_mode: Option<ExecutionMode>,
    },

    /// Same as `terraform_apply` in cloud mode
    #[serde(rename_all = "camelCase")]
    TerraformApplySimulation { config_id: u64 },

    /// Same as `ansible_run` in cloud mode
    #[serde(rename_all = "camelCase")]
    AnsibleRunSimulation { playbook_id: u64 },

    #[serde(rename_all = "camelCase")]
    ResourceUpdate { resource_id: u64, status: String },
}

impl ClientMessage {
    /// The run this message asks for, if it asks for one
    pub fn operation(&self) -> Option<OperationRequest> {
        let (family, target_id, mode) = match *self {
            ClientMessage::TerraformApply {
                config_id,
                execution_mode,
            } => (
                OperationFamily::Terraform,
                config_id,
                execution_mode.unwrap_or_default(),
            ),
            ClientMessage::AnsibleRun {
                playbook_id,
                execution_mode,
            } => (
                OperationFamily::Ansible,
                playbook_id,
                execution_mode.unwrap_or_default(),
            ),
            ClientMessage::TerraformApplySimulation { config_id } => {
                (OperationFamily::Terraform, config_id, ExecutionMode::Cloud)
            }
            ClientMessage::AnsibleRunSimulation { playbook_id } => {
                (OperationFamily::Ansible, playbook_id, ExecutionMode::Cloud)
            }
            ClientMessage::ResourceUpdate { .. } => return None,
        };
        Some(OperationRequest {
            family,
            target_id,
            mode,
        })
    }
}

/// Absent, null or empty means the default; `"local"` runs locally and
/// any other name is simulated.
fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<ExecutionMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let mode = Option::<String>::deserialize(deserializer)?;
    Ok(mode.filter(|m| !m.is_empty()).map(|m| match m.as_str() {
        "local" => ExecutionMode::Local,
        _ => ExecutionMode::Cloud,
    }))
}

/// Everything a client sees on connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub resources: Vec<Resource>,
    pub terraform_configs: Vec<TerraformConfig>,
    pub ansible_playbooks: Vec<AnsiblePlaybook>,
    pub deployments: Vec<Deployment>,
    pub templates: Vec<InfraTemplate>,
}

/// Outbound events, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    InitialData {
        data: Snapshot,
    },

    DeploymentStarted {
        deployment: Deployment,
    },

    DeploymentCompleted {
        deployment: Deployment,
    },

    #[serde(rename_all = "camelCase")]
    TerraformOutput {
        config_id: u64,
        message: String,
        deployment_id: u64,
        logs: String,
    },

    #[serde(rename_all = "camelCase")]
    AnsibleOutput {
        playbook_id: u64,
        message: String,
        deployment_id: u64,
        logs: String,
    },

    #[serde(rename_all = "camelCase")]
    TerraformError { config_id: u64, message: String },

    #[serde(rename_all = "camelCase")]
    AnsibleError { playbook_id: u64, message: String },

    ResourceCreated {
        resource: Resource,
    },

    ResourceUpdated {
        resource: Resource,
    },

    TerraformConfigCreated {
        config: TerraformConfig,
    },

    TerraformConfigUpdated {
        config: TerraformConfig,
    },

    AnsiblePlaybookCreated {
        playbook: AnsiblePlaybook,
    },

    AnsiblePlaybookUpdated {
        playbook: AnsiblePlaybook,
    },

    TemplateCreated {
        template: InfraTemplate,
    },

    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// `terraform_output` or `ansible_output`
    pub fn output(
        family: OperationFamily,
        target_id: u64,
        message: impl Into<String>,
        deployment_id: u64,
        logs: impl Into<String>,
    ) -> Self {
        let (message, logs) = (message.into(), logs.into());
        match family {
            OperationFamily::Terraform => ServerEvent::TerraformOutput {
                config_id: target_id,
                message,
                deployment_id,
                logs,
            },
            OperationFamily::Ansible => ServerEvent::AnsibleOutput {
                playbook_id: target_id,
                message,
                deployment_id,
                logs,
            },
        }
    }

    /// `terraform_error` or `ansible_error`
    pub fn run_error(family: OperationFamily, target_id: u64, message: impl Into<String>) -> Self {
        let message = message.into();
        match family {
            OperationFamily::Terraform => ServerEvent::TerraformError {
                config_id: target_id,
                message,
            },
            OperationFamily::Ansible => ServerEvent::AnsibleError {
                playbook_id: target_id,
                message,
            },
        }
    }

    /// Wire name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::InitialData { .. } => "initial_data",
            ServerEvent::DeploymentStarted { .. } => "deployment_started",
            ServerEvent::DeploymentCompleted { .. } => "deployment_completed",
            ServerEvent::TerraformOutput { .. } => "terraform_output",
            ServerEvent::AnsibleOutput { .. } => "ansible_output",
            ServerEvent::TerraformError { .. } => "terraform_error",
            ServerEvent::AnsibleError { .. } => "ansible_error",
            ServerEvent::ResourceCreated { .. } => "resource_created",
            ServerEvent::ResourceUpdated { .. } => "resource_updated",
            ServerEvent::TerraformConfigCreated { .. } => "terraform_config_created",
            ServerEvent::TerraformConfigUpdated { .. } => "terraform_config_updated",
            ServerEvent::AnsiblePlaybookCreated { .. } => "ansible_playbook_created",
            ServerEvent::AnsiblePlaybookUpdated { .. } => "ansible_playbook_updated",
            ServerEvent::TemplateCreated { .. } => "template_created",
            ServerEvent::Error { .. } => "error",
        }
    }
}
