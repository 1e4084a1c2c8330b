//! Workspace janitor: removes expired run workspaces

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::deploy::workspace::WorkspaceManager;

/// Janitor worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Sweep interval
    pub interval: Duration,

    /// Workspaces older than this are removed
    pub retention: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            retention: Duration::from_secs(86_400),
        }
    }
}

/// Run the janitor worker
pub async fn run<S, F>(
    options: &Options,
    workspaces: &WorkspaceManager,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!(
        "Janitor worker starting (retention {:?}, every {:?})...",
        options.retention, options.interval
    );

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Janitor worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        debug!("Sweeping expired workspaces...");
        match workspaces.prune(options.retention).await {
            Ok(removed) => debug!(
                "Sweep removed {} workspaces, {} held by running jobs",
                removed,
                workspaces.in_use()
            ),
            Err(e) => error!("Workspace sweep failed: {}", e),
        }
    }
}
