//! Infrastructure template models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable infrastructure blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraTemplate {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,

    /// AWS, GCP, Azure...
    pub provider: String,

    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInfraTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub content: String,
}

impl NewInfraTemplate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name: required".to_string());
        }
        if self.provider.trim().is_empty() {
            errors.push("provider: required".to_string());
        }
        if self.content.is_empty() {
            errors.push("content: required".to_string());
        }
        errors
    }
}
