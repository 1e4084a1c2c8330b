//! Ansible playbook models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An Ansible playbook that can be run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsiblePlaybook {
    pub id: u64,
    pub name: String,

    /// YAML written to `playbook.yml`
    pub content: String,

    /// Set every time a run is started
    pub last_run: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Payload for creating a playbook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnsiblePlaybook {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub content: String,
}

impl NewAnsiblePlaybook {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name: required".to_string());
        }
        if self.content.is_empty() {
            errors.push("content: required".to_string());
        }
        errors
    }
}

/// Partial update of a playbook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsiblePlaybookPatch {
    pub name: Option<String>,
    pub content: Option<String>,
}
