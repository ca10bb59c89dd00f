//! # printer-client
//!
//! The printer session contract consumed by printerd.
//!
//! ## Scope
//!
//! This crate defines WHAT a printer session can do:
//! - connect (direct or through the relay) and authenticate
//! - report the printer's current state
//! - camera frames, print submission, job and filament commands
//! - a one-shot disconnect notification
//!
//! Connection lifecycle (retry, backoff, lookup) stays in printerd.
//!
//! The device wire protocol is not implemented here. [`SimulatedFactory`]
//! provides in-memory devices for the `simulated` driver and for tests.
//!
//! ## Example
//!
//! ```ignore
//! use printer_client::{ClientFactory, SimulatedDevice, SimulatedFactory};
//! use shared::PrinterConfig;
//!
//! let factory = SimulatedFactory::new();
//! let device = factory.insert_device("10.0.0.5:9999", SimulatedDevice::new("ABC123", "printer-name"));
//!
//! let client = factory.create(&PrinterConfig::local("10.0.0.5", 9999));
//! client.connect_local("10.0.0.5", 9999).await?;
//! client.authenticate("token", "user").await?;
//! client.suspend().await?;
//! ```

mod client;
mod error;
mod simulated;

// Re-exports
pub use client::{ClientFactory, DisconnectCallback, PrintSource, PrinterClient};
pub use error::{ClientError, ClientResult};
pub use simulated::{ReceivedPrint, SimulatedClient, SimulatedDevice, SimulatedFactory};
