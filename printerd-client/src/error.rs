//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The daemon answered with an error envelope
    ///
    /// `status` is 200 for errors reported by the printer itself.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Base URL cannot carry a path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a print file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Unknown printer id (or a printer that is not connected)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// The daemon runs read-only
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::FORBIDDEN)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
