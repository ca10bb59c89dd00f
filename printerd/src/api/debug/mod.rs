//! Debug routes (only mounted when `debug` is set)

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::ApiResult;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/_/stats", get(stats))
}

#[derive(Debug, Serialize)]
pub struct RuntimeStats {
    worker_threads: usize,
    alive_tasks: usize,
    cpus: usize,
    uptime_seconds: u64,
    supervisors: usize,
}

async fn stats(State(state): State<ServerState>) -> ApiResult<RuntimeStats> {
    let metrics = tokio::runtime::Handle::current().metrics();
    ApiResult::success(RuntimeStats {
        worker_threads: metrics.num_workers(),
        alive_tasks: metrics.num_alive_tasks(),
        cpus: std::thread::available_parallelism().map_or(1, |n| n.get()),
        uptime_seconds: state.uptime().as_secs(),
        supervisors: state.registry.len(),
    })
}
