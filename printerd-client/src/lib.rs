//! printerd client - typed HTTP client for the printerd control plane
//!
//! Talks to a daemon started with `listen_tcp` enabled.
//!
//! ```no_run
//! # async fn demo() -> printerd_client::ClientResult<()> {
//! let client = printerd_client::PrinterdClient::new("http://127.0.0.1:6969")?;
//! for printer in client.printers().await? {
//!     println!("{} ({})", printer.machine_name, printer.serial);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::PrinterdClient;

// Re-export shared types for convenience
pub use shared::{ApiResult, ConnectionStatus, Job, Printer};
