//! Connected client registry

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;
use tracing::{error, trace};

use crate::hub::messages::ServerEvent;
use crate::utils::generate_uuid;

/// Identity of one connected client
pub type ClientId = String;

/// Outbound queues of every connected client.
///
/// Sends never block; a client whose queue is gone is skipped.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, mpsc::UnboundedSender<String>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and return its id and outbound queue
    pub fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<String>) {
        let id = generate_uuid();
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut clients) = self.clients.write() {
            clients.insert(id.clone(), tx);
        }
        (id, rx)
    }

    pub fn remove(&self, id: &ClientId) -> bool {
        self.clients
            .write()
            .map(|mut clients| clients.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.clients.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send to a single client; false if it is gone
    pub fn send_to(&self, id: &ClientId, event: &ServerEvent) -> bool {
        let Some(text) = encode(event) else {
            return false;
        };
        let Ok(clients) = self.clients.read() else {
            return false;
        };
        match clients.get(id) {
            Some(tx) => tx.send(text).is_ok(),
            None => {
                trace!("Dropping {} for departed client {}", event.kind(), id);
                false
            }
        }
    }

    /// Send to every client, returning how many accepted it
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };
        let Ok(clients) = self.clients.read() else {
            return 0;
        };
        clients
            .values()
            .filter(|tx| tx.send(text.clone()).is_ok())
            .count()
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize {}: {}", event.kind(), e);
            None
        }
    }
}
