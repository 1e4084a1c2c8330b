//! Realtime hub: client registry, message routing and the WebSocket endpoint

pub mod messages;
pub mod registry;
pub mod socket;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::deploy::pipeline::{OperationRequest, Pipeline};
use crate::errors::DeckError;
use crate::hub::messages::{ClientMessage, ServerEvent, Snapshot};
use crate::hub::registry::{ClientId, ClientRegistry};
use crate::storage::provider::Storage;

pub const PROCESSING_ERROR: &str = "Error processing your request";
pub const RESOURCE_NOT_FOUND: &str = "Resource not found";

/// A registered client and the queue of serialized events addressed to it
pub struct ClientConnection {
    pub id: ClientId,
    pub events: mpsc::UnboundedReceiver<String>,
}

/// Routes inbound client messages and fans events out to clients
pub struct Hub {
    clients: Arc<ClientRegistry>,
    storage: Arc<dyn Storage>,
    pipeline: Arc<Pipeline>,
}

impl Hub {
    pub fn new(
        clients: Arc<ClientRegistry>,
        storage: Arc<dyn Storage>,
        pipeline: Arc<Pipeline>,
    ) -> Self {
        Self {
            clients,
            storage,
            pipeline,
        }
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Register a client and queue the `initial_data` snapshot for it
    pub async fn connect(&self) -> ClientConnection {
        let (id, events) = self.clients.register();
        info!("Client {} connected ({} total)", id, self.clients.len());

        match self.snapshot().await {
            Ok(data) => {
                self.clients.send_to(&id, &ServerEvent::InitialData { data });
            }
            Err(e) => {
                error!("Failed to build initial snapshot for {}: {}", id, e);
                self.clients.send_to(&id, &ServerEvent::error(PROCESSING_ERROR));
            }
        }

        ClientConnection { id, events }
    }

    pub fn disconnect(&self, id: &ClientId) {
        if self.clients.remove(id) {
            info!("Client {} disconnected ({} left)", id, self.clients.len());
        }
    }

    /// Send to every connected client
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        self.clients.broadcast(event)
    }

    /// Handle one inbound text frame from `sender`.
    ///
    /// Operations run on their own task; the handle is returned so callers
    /// may wait for the run to finish.
    pub async fn handle_message(&self, sender: &ClientId, text: &str) -> Option<JoinHandle<()>> {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unrecognized message from {}: {}", sender, e);
                self.clients.send_to(sender, &ServerEvent::error(PROCESSING_ERROR));
                return None;
            }
        };
        debug!("Message from {}: {:?}", sender, message);

        if let Some(request) = message.operation() {
            return Some(self.launch(sender, request));
        }

        if let ClientMessage::ResourceUpdate {
            resource_id,
            status,
        } = message
        {
            if let Err(e) = self.update_resource(resource_id, &status).await {
                self.reply_error(sender, &e);
            }
        }
        None
    }

    fn launch(&self, sender: &ClientId, request: OperationRequest) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let clients = self.clients.clone();
        let sender = sender.clone();

        tokio::spawn(async move {
            if let Err(e) = pipeline.launch(request, &sender).await {
                warn!("Request {:?} from {} rejected: {}", request, sender, e);
                clients.send_to(&sender, &ServerEvent::error(error_message(&e)));
            }
        })
    }

    async fn update_resource(&self, id: u64, status: &str) -> Result<(), DeckError> {
        if status.is_empty() {
            return Err(DeckError::ProtocolError("resource status is empty".to_string()));
        }
        let resource = self
            .storage
            .update_resource_status(id, status)
            .await?
            .ok_or_else(|| DeckError::NotFound(RESOURCE_NOT_FOUND.to_string()))?;
        self.broadcast(&ServerEvent::ResourceUpdated { resource });
        Ok(())
    }

    fn reply_error(&self, sender: &ClientId, err: &DeckError) {
        warn!("Request from {} failed: {}", sender, err);
        self.clients.send_to(sender, &ServerEvent::error(error_message(err)));
    }

    async fn snapshot(&self) -> Result<Snapshot, DeckError> {
        Ok(Snapshot {
            resources: self.storage.list_resources().await?,
            terraform_configs: self.storage.list_terraform_configs().await?,
            ansible_playbooks: self.storage.list_ansible_playbooks().await?,
            deployments: self.storage.list_deployments().await?,
            templates: self.storage.list_templates().await?,
        })
    }
}

/// Client-facing text for a rejected request
fn error_message(err: &DeckError) -> String {
    match err {
        DeckError::NotFound(message) => message.clone(),
        _ => PROCESSING_ERROR.to_string(),
    }
}
