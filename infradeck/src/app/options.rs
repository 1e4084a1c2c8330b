//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::storage::settings::{ExecutorSettings, Settings};
use crate::workers::janitor;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage layout paths
    pub layout: StorageLayout,

    /// Server configuration
    pub server: ServerOptions,

    /// Local execution configuration
    pub executor: ExecutorSettings,

    /// Populate storage with demo data on startup
    pub seed_demo_data: bool,

    /// Janitor worker options; `None` disables the worker
    pub janitor: Option<janitor::Options>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            layout: StorageLayout::default(),
            server: ServerOptions::default(),
            executor: ExecutorSettings::default(),
            seed_demo_data: true,
            janitor: Some(janitor::Options::default()),
        }
    }
}

impl AppOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let janitor = settings
            .workspace
            .retention()
            .map(|retention| janitor::Options {
                interval: Duration::from_secs(settings.workspace.sweep_interval_secs.max(1)),
                retention,
            });

        Self {
            layout: StorageLayout::new(settings.workspace.base_dir.clone()),
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            executor: settings.executor.clone(),
            seed_demo_data: settings.seed_demo_data,
            janitor,
            ..Default::default()
        }
    }
}

/// Lifecycle options for the server
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}
