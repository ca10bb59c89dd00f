//! Client configuration

use std::time::Duration;

/// Where the daemon lives and how long to wait for it
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Daemon base URL (e.g., "http://127.0.0.1:6969")
    pub base_url: String,

    /// Request timeout; uploads share it, so keep it generous
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:6969")
    }
}
