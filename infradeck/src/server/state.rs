//! Server state

use std::sync::Arc;

use crate::hub::Hub;
use crate::storage::provider::Storage;

/// Server state shared across handlers
pub struct ServerState {
    pub storage: Arc<dyn Storage>,
    pub hub: Arc<Hub>,
}

impl ServerState {
    pub fn new(storage: Arc<dyn Storage>, hub: Arc<Hub>) -> Self {
        Self { storage, hub }
    }
}
