//! Server state
//!
//! Everything a handler needs, passed explicitly through axum `State`.
//! Cloning is cheap (shared references).

use crate::connection::ConnectionRegistry;
use crate::core::Config;
use printer_client::ClientFactory;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct ServerState {
    /// Configuration (immutable after load)
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    started_at: Instant,
}

impl ServerState {
    /// Build the registry for every configured printer
    pub fn new(config: Config, factory: Arc<dyn ClientFactory>) -> Self {
        let registry = ConnectionRegistry::from_config(&config, factory);
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: Config, registry: ConnectionRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Bound on every device operation issued by a handler
    pub fn operation_timeout(&self) -> Duration {
        self.config.operation_timeout()
    }
}
