//! Shared application state for all routes.

use crate::hub::Hub;
use crate::repository::StorageProbe;
use crate::service::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Entity → service table, built once at startup.
    pub registry: Arc<Registry>,
    pub hub: Hub,
    /// Answers the health check.
    pub probe: Arc<dyn StorageProbe>,
}

impl AppState {
    pub fn new(registry: Registry, hub: Hub, probe: Arc<dyn StorageProbe>) -> Self {
        AppState {
            registry: Arc::new(registry),
            hub,
            probe,
        }
    }
}
