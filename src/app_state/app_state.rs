/// Application state shared across handlers
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::pty::{PortablePtyFactory, PtySpawner};
use crate::service::{BroadcastRegistry, EventStore, SessionRegistry};

/// Shared state: configuration plus the two registries and the event store.
/// Cloning is cheap; everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<ServerConfig>,
    /// Terminal session registry
    pub terminals: SessionRegistry,
    /// Event broadcast registry (stream viewers)
    pub stream: BroadcastRegistry,
    /// Recent-event store backing replay and the REST query
    pub events: EventStore,
}

impl AppState {
    /// Create state with the production PTY backend
    pub fn new(config: ServerConfig) -> Self {
        Self::with_spawner(config, Arc::new(PortablePtyFactory))
    }

    /// Create state with a specific PTY backend (tests use the mock)
    pub fn with_spawner(config: ServerConfig, spawner: Arc<dyn PtySpawner>) -> Self {
        let events = EventStore::new(config.events.capacity);
        Self {
            config: Arc::new(config),
            terminals: SessionRegistry::new(spawner),
            stream: BroadcastRegistry::new(),
            events,
        }
    }

    /// Ingest a batch of events: persist to the store, then fan out to
    /// every connected stream viewer.
    pub async fn ingest(&self, events: &[serde_json::Value]) {
        self.events.append(events).await;
        self.stream.broadcast(events).await;
    }
}
