//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deploy::strategy::scripts;
use crate::errors::DeckError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Also write rolling log files under `<base_dir>/logs`
    #[serde(default)]
    pub log_to_file: bool,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub json_logs: bool,

    /// HTTP / WebSocket listener
    #[serde(default)]
    pub server: ServerSettings,

    /// Workspace location and retention
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    /// Local execution
    #[serde(default)]
    pub executor: ExecutorSettings,

    /// Load the demo inventory into the empty store at startup
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_to_file: false,
            json_logs: false,
            server: ServerSettings::default(),
            workspace: WorkspaceSettings::default(),
            executor: ExecutorSettings::default(),
            seed_demo_data: true,
        }
    }
}

impl Settings {
    /// Read settings from `file`, falling back to defaults when it does not exist
    pub async fn load(file: &File) -> Result<Self, DeckError> {
        if !file.exists().await {
            info!(
                "Settings file {} not found, using defaults",
                file.path().display()
            );
            return Ok(Self::default());
        }
        file.read_json().await
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Workspace settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Data directory; workspaces live under `<base_dir>/workspaces`
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Age after which a finished workspace is deleted; 0 keeps them forever
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// How often the janitor looks for expired workspaces
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./infradeck-data")
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

impl WorkspaceSettings {
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Local execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Shell used to interpret each stage command
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Commands run in order for a local Terraform apply
    #[serde(default = "scripts::terraform_local_stages")]
    pub terraform_stages: Vec<String>,

    /// Commands run in order for a local Ansible run
    #[serde(default = "scripts::ansible_local_stages")]
    pub ansible_stages: Vec<String>,

    /// Upper bound for a single run; unset means runs may take forever
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

fn default_shell() -> String {
    "sh".to_string()
}

impl ExecutorSettings {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            terraform_stages: scripts::terraform_local_stages(),
            ansible_stages: scripts::ansible_local_stages(),
            run_timeout_secs: None,
        }
    }
}
