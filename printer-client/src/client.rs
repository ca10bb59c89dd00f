//! Printer session contract

use crate::error::ClientResult;
use async_trait::async_trait;
use shared::{Printer, PrinterConfig};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Invoked once when an established session drops
pub type DisconnectCallback = Box<dyn FnOnce() + Send + 'static>;

/// Print file contents streamed to the printer
pub type PrintSource = Box<dyn AsyncRead + Send + Unpin>;

/// One session with one physical printer
///
/// Implementations serialize their own commands; callers may invoke
/// operations concurrently.
#[async_trait]
pub trait PrinterClient: Send + Sync {
    /// Open a direct session to `ip:port`
    async fn connect_local(&self, ip: &str, port: u16) -> ClientResult<()>;

    /// Open a session through the relay using the device's registered id
    async fn connect_remote(&self, remote_id: &str, auth_token: &str) -> ClientResult<()>;

    /// Authenticate a direct session
    async fn authenticate(&self, auth_token: &str, username: &str) -> ClientResult<()>;

    /// Register the disconnect callback
    ///
    /// Replaces any previously registered callback. The callback fires at
    /// most once, when a session opened after registration drops.
    fn on_disconnect(&self, callback: DisconnectCallback);

    /// Current reported printer state
    fn printer(&self) -> Printer;

    /// Latest camera frame (encoded image bytes)
    async fn camera_frame(&self) -> ClientResult<Vec<u8>>;

    /// Stream a print file of `size` bytes to the printer and start it
    async fn print(&self, filename: &str, data: PrintSource, size: u64) -> ClientResult<()>;

    async fn suspend(&self) -> ClientResult<()>;

    async fn resume(&self) -> ClientResult<()>;

    /// Cancel the current job
    async fn cancel(&self) -> ClientResult<()>;

    async fn load_filament(&self, tool_index: u32) -> ClientResult<()>;

    async fn unload_filament(&self, tool_index: u32) -> ClientResult<()>;
}

/// Builds a fresh, unconnected client for a configured printer
pub trait ClientFactory: Send + Sync {
    /// Driver name, as written in the config file
    fn driver(&self) -> &'static str;

    fn create(&self, config: &PrinterConfig) -> Arc<dyn PrinterClient>;
}
