//! Data models
//!
//! Shared between printerd, the printer client and API consumers.

pub mod connection;
pub mod printer;
pub mod printer_config;

// Re-exports
pub use connection::*;
pub use printer::*;
pub use printer_config::*;
