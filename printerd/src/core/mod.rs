//! Core: configuration, state, server and errors
//!
//! - [`Config`] - persisted configuration
//! - [`LaunchOptions`] - environment launch options
//! - [`ServerState`] - state shared by every handler
//! - [`Server`] - listeners and lifecycle
//! - [`BackgroundTasks`] - supervising task management

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, LaunchOptions};
pub use error::{ConfigError, Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::BackgroundTasks;
