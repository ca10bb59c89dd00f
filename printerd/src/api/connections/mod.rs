//! Connection status route
//!
//! `GET /api/v1/connections` lists every configured printer's supervisor
//! state, including printers that are not connected and so invisible to
//! `/api/v1/printers`.

use axum::{Router, extract::State, routing::get};
use shared::{ApiResult, ConnectionStatus};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/connections", get(list))
}

async fn list(State(state): State<ServerState>) -> ApiResult<Vec<ConnectionStatus>> {
    ApiResult::success(state.registry.statuses())
}
