//! Error types for printer sessions

use thiserror::Error;

/// Printer client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session could not be opened
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handshake rejected the credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The printer refused a command; the message is the printer's own
    #[error("{0}")]
    Rejected(String),

    /// No open, authenticated session
    #[error("not connected")]
    NotConnected,

    /// Timeout waiting for the printer
    #[error("timed out: {0}")]
    Timeout(String),

    /// IO error while streaming data to the printer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for printer operations
pub type ClientResult<T> = Result<T, ClientError>;
