//! Daemon error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors (always fatal at startup)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no listener enabled: set listen_socket or listen_tcp")]
    NoListener,

    #[error("invalid listen_tcp_address {0:?}")]
    InvalidAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("unknown printer driver {0:?}")]
    UnknownDriver(String),
}

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket {0} already exists (set PRINTERD_FORCE_LISTEN=1 to replace it)")]
    SocketInUse(PathBuf),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type for server startup and shutdown
pub type Result<T> = std::result::Result<T, ServerError>;
