//! HTTP service
//!
//! Assembles the API router and its middleware stack.

use crate::core::{Config, ServerState};
use axum::{Router, middleware};
use shared::AppError;
use tower_http::trace::TraceLayer;

/// HTTP request logging middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app(config: &Config) -> Router<ServerState> {
    let app = Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .nest(
            "/api/v1",
            crate::api::printers::router(config).merge(crate::api::connections::router()),
        );

    let app = if config.debug {
        app.merge(crate::api::debug::router())
    } else {
        app
    };

    app.fallback(|| async { AppError::not_found() })
        .method_not_allowed_fallback(|| async { AppError::method_not_allowed() })
}

/// Build the complete service: routes, state and middleware
pub fn build_router(state: ServerState) -> Router {
    build_app(&state.config)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request))
}
