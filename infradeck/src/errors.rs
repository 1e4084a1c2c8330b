//! Error types for the infradeck server

use std::time::Duration;

use thiserror::Error;

/// Main error type for infradeck
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Workspace error: {0}")]
    WorkspaceError(String),

    #[error(transparent)]
    ProcessError(#[from] ProcessError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Validation error: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Run timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a spawned command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The command could not be started at all
    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    /// Reading output or waiting for exit failed
    #[error("Process I/O error: {0}")]
    Io(String),

    /// The command ran and exited unsuccessfully
    #[error("Command exited with code {}: {output}", exit_label(.code))]
    Exited { code: Option<i32>, output: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::Internal(err.to_string())
    }
}
