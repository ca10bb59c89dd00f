//! Connection status
//!
//! Observability snapshot of one printer supervisor, served by
//! `GET /api/v1/connections`.

use super::printer_config::ConnectionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supervisor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Point-in-time view of a supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Configured device key (`ip:port` or remote id)
    pub id: String,
    pub connection_type: ConnectionType,
    pub state: ConnectionState,
    /// Connection attempts since startup (successful or not)
    pub attempts: u64,
    /// Most recent connect or disconnect error
    pub last_error: Option<String>,
    pub connected_since: Option<DateTime<Utc>>,
    /// Identity of the connected printer
    pub serial: Option<String>,
    pub machine_name: Option<String>,
}
