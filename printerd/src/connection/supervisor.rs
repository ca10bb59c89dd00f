//! Connection supervisor
//!
//! One [`Supervisor`] per configured printer. It owns the printer client and
//! drives it through `disconnected -> connecting -> connected`, reconnecting
//! after every failure or dropped session.
//!
//! The client's disconnect callback never touches supervisor state. It only
//! enqueues a [`DisconnectEvent`] tagged with the session generation; the
//! supervising task ([`Supervisor::run`]) consumes the queue and ignores
//! events from superseded sessions.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use printer_client::{ClientError, ClientFactory, PrinterClient};
use shared::{ConnectionState, ConnectionStatus, ConnectionType, Printer, PrinterConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Account credentials shared by every supervisor
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub auth_token: String,
}

/// Timing of connect attempts
#[derive(Debug, Clone, Copy)]
pub struct SupervisorPolicy {
    /// Wait between a failure (or disconnect) and the next attempt
    pub reconnect_delay: Duration,
    /// Upper bound on one connect attempt, handshake included
    pub connect_timeout: Duration,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a connect attempt failed
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid connection type {0:?}")]
    InvalidConnectionType(String),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Session with the printer; the client only exists while connected
enum Link {
    Disconnected,
    Connecting,
    Connected(Arc<dyn PrinterClient>),
}

struct SupervisorState {
    link: Link,
    /// Bumped on every attempt; disconnect events carry the value they
    /// were registered with
    generation: u64,
    attempts: u64,
    last_error: Option<String>,
    connected_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisconnectEvent {
    generation: u64,
}

/// Owns the connection lifecycle of one printer
pub struct Supervisor {
    config: PrinterConfig,
    key: String,
    credentials: Credentials,
    factory: Arc<dyn ClientFactory>,
    policy: SupervisorPolicy,
    state: RwLock<SupervisorState>,
    events_tx: mpsc::UnboundedSender<DisconnectEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<DisconnectEvent>>>,
}

impl Supervisor {
    pub fn new(
        config: PrinterConfig,
        credentials: Credentials,
        factory: Arc<dyn ClientFactory>,
        policy: SupervisorPolicy,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            key: config.key(),
            config,
            credentials,
            factory,
            policy,
            state: RwLock::new(SupervisorState {
                link: Link::Disconnected,
                generation: 0,
                attempts: 0,
                last_error: None,
                connected_since: None,
            }),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// `ip:port` for local printers, the device id for remote ones
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state.read().link, Link::Connected(_))
    }

    /// Authenticated client, when connected
    pub fn client(&self) -> Option<Arc<dyn PrinterClient>> {
        match &self.state.read().link {
            Link::Connected(client) => Some(client.clone()),
            _ => None,
        }
    }

    /// Reported printer state, when connected
    pub fn printer(&self) -> Option<Printer> {
        self.client().map(|client| client.printer())
    }

    pub fn status(&self) -> ConnectionStatus {
        let (state, client, attempts, last_error, connected_since) = {
            let s = self.state.read();
            let (state, client) = match &s.link {
                Link::Disconnected => (ConnectionState::Disconnected, None),
                Link::Connecting => (ConnectionState::Connecting, None),
                Link::Connected(client) => (ConnectionState::Connected, Some(client.clone())),
            };
            (state, client, s.attempts, s.last_error.clone(), s.connected_since)
        };
        let printer = client.map(|c| c.printer());

        ConnectionStatus {
            id: self.key.clone(),
            connection_type: self.config.connection_type.clone(),
            state,
            attempts,
            last_error,
            connected_since,
            serial: printer.as_ref().map(|p| p.serial.clone()),
            machine_name: printer.map(|p| p.machine_name),
        }
    }

    /// Make one connect attempt
    ///
    /// On success the supervisor is connected; on failure it is
    /// disconnected and the error is also kept as `last_error`.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let (generation, attempt) = {
            let mut state = self.state.write();
            state.generation += 1;
            state.attempts += 1;
            state.link = Link::Connecting;
            (state.generation, state.attempts)
        };
        debug!(printer = %self.key, attempt, "Connecting");

        let result = match tokio::time::timeout(
            self.policy.connect_timeout,
            self.open_session(generation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ConnectError::Timeout(self.policy.connect_timeout)),
        };

        let mut state = self.state.write();
        match result {
            Ok(client) => {
                state.link = Link::Connected(client);
                state.last_error = None;
                state.connected_since = Some(Utc::now());
                info!(printer = %self.key, attempt, "Printer connected");
                Ok(())
            }
            Err(e) => {
                state.link = Link::Disconnected;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn open_session(&self, generation: u64) -> Result<Arc<dyn PrinterClient>, ConnectError> {
        if let ConnectionType::Unknown(raw) = &self.config.connection_type {
            return Err(ConnectError::InvalidConnectionType(raw.clone()));
        }

        let client = self.factory.create(&self.config);
        let events = self.events_tx.clone();
        client.on_disconnect(Box::new(move || {
            let _ = events.send(DisconnectEvent { generation });
        }));

        let creds = &self.credentials;
        match self.config.connection_type {
            ConnectionType::Local => {
                client.connect_local(&self.config.ip, self.config.port).await?;
                client.authenticate(&creds.auth_token, &creds.username).await?;
            }
            ConnectionType::Remote => {
                client.connect_remote(&self.config.id, &creds.auth_token).await?;
            }
            ConnectionType::Unknown(_) => {}
        }
        Ok(client)
    }

    /// Apply a disconnect event; returns false for stale events
    fn handle_disconnect(&self, event: DisconnectEvent) -> bool {
        let mut state = self.state.write();
        if event.generation != state.generation {
            debug!(printer = %self.key, generation = event.generation, "Ignoring stale disconnect");
            return false;
        }
        state.link = Link::Disconnected;
        state.connected_since = None;
        state.last_error = Some("connection lost".to_string());
        warn!(printer = %self.key, "Printer disconnected");
        true
    }

    fn mark_disconnected(&self) {
        let mut state = self.state.write();
        state.link = Link::Disconnected;
        state.connected_since = None;
    }

    async fn wait_for_disconnect(&self, events: &mut mpsc::UnboundedReceiver<DisconnectEvent>) {
        while let Some(event) = events.recv().await {
            if self.handle_disconnect(event) {
                return;
            }
        }
    }

    /// Supervising loop: connect, wait for the session to drop, back off,
    /// repeat, until `shutdown` is cancelled
    ///
    /// Every failure is logged and retried, configuration errors included.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let Some(mut events) = self.events_rx.lock().take() else {
            warn!(printer = %self.key, "Supervisor is already running");
            return;
        };
        info!(printer = %self.key, connection_type = %self.config.connection_type, "Supervisor started");

        loop {
            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.connect() => match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(printer = %self.key, error = %e, "Connect failed");
                        false
                    }
                },
            };

            if connected {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = self.wait_for_disconnect(&mut events) => {}
                }
            }

            debug!(
                printer = %self.key,
                delay_secs = self.policy.reconnect_delay.as_secs_f64(),
                "Reconnecting after delay"
            );
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.policy.reconnect_delay) => {}
            }
        }

        self.mark_disconnected();
        info!(printer = %self.key, "Supervisor stopped");
    }
}
