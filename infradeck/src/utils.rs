//! Small helpers shared across modules

use serde::{Deserialize, Serialize};

/// Build metadata reported by `--version` and `GET /version`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
    pub profile: String,
}

fn build_env(value: Option<&'static str>) -> String {
    value.unwrap_or("unknown").to_string()
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: build_env(option_env!("GIT_HASH")),
        build_time: build_env(option_env!("BUILD_TIME")),
        profile: build_env(option_env!("BUILD_PROFILE")),
    }
}

/// Generate a random UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short random lowercase suffix used in synthetic resource ids (`vpc-1a2b3c4d`)
pub fn short_id(len: usize) -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(len)
        .collect()
}

/// Milliseconds since the Unix epoch
pub fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
