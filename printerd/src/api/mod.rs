//! API routes
//!
//! - [`health`] - health check
//! - [`printers`] - printer control plane (`/api/v1/printers`)
//! - [`connections`] - supervisor status (`/api/v1/connections`)
//! - [`debug`] - runtime statistics (`/_/stats`, debug mode only)

pub mod connections;
pub mod debug;
pub mod health;
pub mod printers;
