//! Terraform configuration models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variable map attached to a configuration
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// A Terraform configuration that can be applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraformConfig {
    pub id: u64,
    pub name: String,

    /// HCL written to `main.tf`
    pub content: String,

    pub variables: Option<Variables>,
    pub created_at: DateTime<Utc>,
}

impl TerraformConfig {
    /// Look up a string variable
    pub fn string_variable(&self, key: &str) -> Option<&str> {
        self.variables.as_ref()?.get(key)?.as_str()
    }
}

/// Payload for creating a configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTerraformConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub variables: Option<Variables>,
}

impl NewTerraformConfig {
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

/// Partial update of a configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraformConfigPatch {
    pub name: Option<String>,
    pub content: Option<String>,
    pub variables: Option<Variables>,
}
