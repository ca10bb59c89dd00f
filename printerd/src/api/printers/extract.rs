//! Path extractors
//!
//! Wrap axum's `Path` so a malformed path parameter still answers with the
//! envelope: an undecodable `{id}` cannot name any printer (404), an
//! undecodable `{tool_index}` is a bad request (400).

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path};
use http::request::Parts;
use serde::Deserialize;
use shared::AppError;

/// `{id}` of a printer route
#[derive(Debug, Clone)]
pub struct PrinterId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for PrinterId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<String>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| PrinterId(id))
            .map_err(reject)
    }
}

/// `{id}` and the still unparsed `{tool_index}` of a filament route
///
/// The index is parsed by the handler, after the printer is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolPath {
    pub id: String,
    pub tool_index: String,
}

impl<S: Send + Sync> FromRequestParts<S> for ToolPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<ToolPath>::from_request_parts(parts, state)
            .await
            .map(|Path(path)| path)
            .map_err(reject)
    }
}

fn reject(rejection: PathRejection) -> AppError {
    tracing::debug!(error = %rejection, "Invalid path parameter");
    match &rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            ErrorKind::InvalidUtf8InPathParam { key } if key == "tool_index" => {
                AppError::bad_request()
            }
            _ => AppError::not_found(),
        },
        _ => AppError::not_found(),
    }
}
