//! Health check route
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | daemon status and printer counts |
//!
//! ```json
//! {
//!   "result": {
//!     "status": "ok",
//!     "version": "0.1.0",
//!     "uptime_seconds": 42,
//!     "read_only": false,
//!     "printers_configured": 2,
//!     "printers_connected": 1
//!   },
//!   "error": null
//! }
//! ```

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::ApiResult;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    read_only: bool,
    printers_configured: usize,
    printers_connected: usize,
}

async fn health(State(state): State<ServerState>) -> ApiResult<HealthResponse> {
    ApiResult::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime().as_secs(),
        read_only: state.config.read_only,
        printers_configured: state.registry.len(),
        printers_connected: state.registry.connected_count(),
    })
}
