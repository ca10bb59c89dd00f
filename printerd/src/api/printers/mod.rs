//! Printer control plane
//!
//! # Routes (under `/api/v1`)
//!
//! | Path | Method | Result |
//! |------|--------|--------|
//! | /printers | GET | connected printers |
//! | /printers/{id} | GET | printer |
//! | /printers/{id}/snapshot.jpg | GET | raw camera frame |
//! | /printers/{id}/current_job | GET | current job (`null` without metadata) |
//! | /printers/{id}/current_job | DELETE | cancel |
//! | /printers/{id}/current_job/suspend | POST | suspend |
//! | /printers/{id}/current_job/resume | POST | resume |
//! | /printers/{id}/prints | POST | multipart `printfile` upload |
//! | /printers/{id}/load_filament/{tool_index} | POST | load filament |
//! | /printers/{id}/unload_filament/{tool_index} | POST | unload filament |
//!
//! `{id}` is a serial (exact) or machine name (any case). Device errors are
//! returned with status 200 in the envelope's `error` field.

mod extract;
mod handler;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http::Method;
use shared::AppError;

use crate::core::{Config, ServerState};

pub fn router(config: &Config) -> Router<ServerState> {
    let router = Router::new()
        .route("/printers", get(handler::list))
        .route("/printers/{id}", get(handler::get_by_id))
        .route("/printers/{id}/snapshot.jpg", get(handler::snapshot))
        .route(
            "/printers/{id}/current_job",
            get(handler::current_job).delete(handler::cancel),
        )
        .route("/printers/{id}/current_job/suspend", post(handler::suspend))
        .route("/printers/{id}/current_job/resume", post(handler::resume))
        .route(
            "/printers/{id}/prints",
            post(handler::print).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route(
            "/printers/{id}/load_filament/{tool_index}",
            post(handler::load_filament),
        )
        .route(
            "/printers/{id}/unload_filament/{tool_index}",
            post(handler::unload_filament),
        );

    if config.read_only {
        router.route_layer(middleware::from_fn(read_only_guard))
    } else {
        router
    }
}

/// Rejects every mutating request before it reaches a handler
async fn read_only_guard(request: Request, next: Next) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }
    tracing::debug!(method = %request.method(), uri = %request.uri(), "Rejected in read-only mode");
    AppError::read_only().into_response()
}
