//! Printer connection configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a supervisor reaches its printer
///
/// Parsed leniently from the config file: anything other than `local` or
/// `remote` is kept verbatim so the supervisor can report it when it tries
/// to connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    /// Direct session to `ip:port`, followed by an authentication handshake
    Local,
    /// Session brokered by the vendor relay, addressed by device id
    Remote,
    /// Unrecognised value from the config file
    Unknown(String),
}

impl From<String> for ConnectionType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "local" => ConnectionType::Local,
            "remote" => ConnectionType::Remote,
            _ => ConnectionType::Unknown(value),
        }
    }
}

impl From<ConnectionType> for String {
    fn from(value: ConnectionType) -> Self {
        match value {
            ConnectionType::Local => "local".to_string(),
            ConnectionType::Remote => "remote".to_string(),
            ConnectionType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Local => write!(f, "local"),
            ConnectionType::Remote => write!(f, "remote"),
            ConnectionType::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// One configured printer (immutable after load)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    pub connection_type: ConnectionType,
    /// Registered device id (used by remote connections)
    #[serde(default)]
    pub id: String,
    /// Device address (used by local connections)
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
}

impl PrinterConfig {
    /// Local printer at `ip:port`
    pub fn local(ip: impl Into<String>, port: u16) -> Self {
        Self {
            connection_type: ConnectionType::Local,
            id: String::new(),
            ip: ip.into(),
            port,
        }
    }

    /// Remote printer registered under `id`
    pub fn remote(id: impl Into<String>) -> Self {
        Self {
            connection_type: ConnectionType::Remote,
            id: id.into(),
            ip: String::new(),
            port: 0,
        }
    }

    /// Stable key identifying the configured device
    ///
    /// `ip:port` for local printers, the device id otherwise.
    pub fn key(&self) -> String {
        match self.connection_type {
            ConnectionType::Local => format!("{}:{}", self.ip, self.port),
            _ if !self.id.is_empty() => self.id.clone(),
            _ => format!("{}:{}", self.ip, self.port),
        }
    }
}
