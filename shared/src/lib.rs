//! Shared types for printerd
//!
//! Common types used across the daemon, the printer client and the API
//! client: domain models, the response envelope and the error system.

pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use models::{
    ConnectionState, ConnectionStatus, ConnectionType, Job, JobStep, Printer, PrinterConfig,
    PrinterMetadata,
};
pub use response::ApiResult;
