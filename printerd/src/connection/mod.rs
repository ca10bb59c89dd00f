//! Printer connections
//!
//! - [`Supervisor`]: connect/reconnect loop for one printer
//! - [`ConnectionRegistry`]: lookup over all supervisors
//! - [`build_factory`]: printer client implementation for the configured driver

mod driver;
mod registry;
mod supervisor;

pub use driver::build_factory;
pub use registry::{ConnectionRegistry, LiveConnection};
pub use supervisor::{ConnectError, Credentials, Supervisor, SupervisorPolicy};
