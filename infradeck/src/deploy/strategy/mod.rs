//! Execution strategies, one per (family, mode) pair

pub mod ansible;
pub mod local;
pub mod scripts;
pub mod simulated;
pub mod terraform;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deploy::output::{Delivery, RunOutput};
use crate::errors::DeckError;
use crate::models::ansible::AnsiblePlaybook;
use crate::models::resource::Resource;
use crate::models::terraform::TerraformConfig;
use crate::storage::provider::Storage;

/// Kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationFamily {
    Terraform,
    Ansible,
}

impl OperationFamily {
    pub fn label(&self) -> &'static str {
        match self {
            OperationFamily::Terraform => "Terraform",
            OperationFamily::Ansible => "Ansible",
        }
    }

    /// Error text when the requested target does not exist
    pub fn not_found_message(&self) -> &'static str {
        match self {
            OperationFamily::Terraform => "Terraform configuration not found",
            OperationFamily::Ansible => "Ansible playbook not found",
        }
    }
}

/// Where an operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Real commands on this host
    #[default]
    Local,

    /// Scripted, simulated output
    Cloud,
}

/// The stored entity an operation acts on
#[derive(Debug, Clone, PartialEq)]
pub enum OperationTarget {
    Terraform(TerraformConfig),
    Ansible(AnsiblePlaybook),
}

impl OperationTarget {
    pub fn id(&self) -> u64 {
        match self {
            OperationTarget::Terraform(config) => config.id,
            OperationTarget::Ansible(playbook) => playbook.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OperationTarget::Terraform(config) => &config.name,
            OperationTarget::Ansible(playbook) => &playbook.name,
        }
    }

    pub fn family(&self) -> OperationFamily {
        match self {
            OperationTarget::Terraform(_) => OperationFamily::Terraform,
            OperationTarget::Ansible(_) => OperationFamily::Ansible,
        }
    }
}

/// Resource side effect of a successful run
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceChange {
    Created(Resource),
    Updated(Resource),
}

#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn family(&self) -> OperationFamily;

    fn mode(&self) -> ExecutionMode;

    /// Who receives per-chunk output
    fn delivery(&self) -> Delivery;

    fn deployment_name(&self, target: &OperationTarget) -> String;

    fn initial_logs(&self) -> &'static str;

    /// Prefix of the `*_error` message when the run fails
    fn failure_prefix(&self) -> &'static str;

    /// Run the operation, pushing output as it arrives. Returns the full output.
    async fn execute(
        &self,
        target: &OperationTarget,
        output: &mut RunOutput,
    ) -> Result<String, DeckError>;

    /// Apply the resource side effect of a successful run
    async fn apply_outcome(
        &self,
        target: &OperationTarget,
        storage: &dyn Storage,
    ) -> Result<Option<ResourceChange>, DeckError>;
}

/// Dispatch table from (family, mode) to strategy
#[derive(Default, Clone)]
pub struct StrategyTable {
    entries: HashMap<(OperationFamily, ExecutionMode), Arc<dyn ExecutionStrategy>>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under its own family and mode, replacing any previous one
    pub fn register(&mut self, strategy: Arc<dyn ExecutionStrategy>) -> &mut Self {
        self.entries
            .insert((strategy.family(), strategy.mode()), strategy);
        self
    }

    pub fn get(
        &self,
        family: OperationFamily,
        mode: ExecutionMode,
    ) -> Option<Arc<dyn ExecutionStrategy>> {
        self.entries.get(&(family, mode)).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
