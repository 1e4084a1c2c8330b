//! Application state

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::pipeline::{standard_strategies, Pipeline};
use crate::deploy::process::ProcessRunner;
use crate::deploy::tracker::DeploymentTracker;
use crate::deploy::workspace::WorkspaceManager;
use crate::errors::DeckError;
use crate::hub::registry::ClientRegistry;
use crate::hub::Hub;
use crate::server::state::ServerState;
use crate::storage::memory::MemStorage;
use crate::storage::provider::Storage;
use crate::storage::seed::seed_demo_data;

/// Main application state
pub struct AppState {
    /// Entity store
    pub storage: Arc<dyn Storage>,

    /// Connected realtime clients
    pub clients: Arc<ClientRegistry>,

    /// Run workspaces
    pub workspaces: Arc<WorkspaceManager>,

    /// Deployment record lifecycle
    pub tracker: Arc<DeploymentTracker>,

    /// Operation pipeline
    pub pipeline: Arc<Pipeline>,

    /// Message routing
    pub hub: Arc<Hub>,
}

impl AppState {
    /// Initialize application state with an in-memory store
    pub async fn init(options: &AppOptions) -> Result<Self, DeckError> {
        info!("Initializing application state...");

        options.layout.setup().await?;

        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        if options.seed_demo_data {
            seed_demo_data(storage.as_ref()).await?;
        }

        Ok(Self::with_storage(storage, options))
    }

    /// Wire every component around an existing store
    pub fn with_storage(storage: Arc<dyn Storage>, options: &AppOptions) -> Self {
        let clients = Arc::new(ClientRegistry::new());
        let workspaces = Arc::new(WorkspaceManager::new(options.layout.workspaces_dir()));
        let runner = Arc::new(ProcessRunner::new(options.executor.shell.clone()));
        let tracker = Arc::new(DeploymentTracker::new(storage.clone()));

        let strategies = standard_strategies(workspaces.clone(), runner, &options.executor);
        let pipeline = Arc::new(
            Pipeline::new(storage.clone(), tracker.clone(), clients.clone(), strategies)
                .with_run_timeout(options.executor.run_timeout()),
        );
        let hub = Arc::new(Hub::new(clients.clone(), storage.clone(), pipeline.clone()));

        Self {
            storage,
            clients,
            workspaces,
            tracker,
            pipeline,
            hub,
        }
    }

    /// State handed to HTTP handlers
    pub fn server_state(&self) -> ServerState {
        ServerState::new(self.storage.clone(), self.hub.clone())
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), DeckError> {
        info!(
            "Shutting down application state ({} clients connected)...",
            self.clients.len()
        );
        Ok(())
    }
}
