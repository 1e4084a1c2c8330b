//! Resource models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A piece of managed infrastructure shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: u64,

    pub name: String,

    /// server, database, storage, network, local...
    #[serde(rename = "type")]
    pub resource_type: String,

    /// healthy, warning, error, configured...
    pub status: String,

    /// Free-form provider details (instance id, uptime, ...)
    pub details: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

/// Payload for creating a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

fn default_status() -> String {
    "healthy".to_string()
}

impl NewResource {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            status: status.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Collect every violation instead of stopping at the first
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name: required".to_string());
        }
        if self.resource_type.trim().is_empty() {
            errors.push("type: required".to_string());
        }
        if self.status.trim().is_empty() {
            errors.push("status: must not be empty".to_string());
        }
        errors
    }
}
