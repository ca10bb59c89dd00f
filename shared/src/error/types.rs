//! Application error type

use super::codes::ErrorCode;
use crate::response::ApiResult;
use http::StatusCode;
use thiserror::Error;

/// Application error with a structured code and the envelope message
///
/// The `message` is what ends up in the `error` field of the envelope, so
/// device errors keep the printer's own wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Envelope message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Unknown printer id (or a printer that is not connected)
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound)
    }

    /// Invalid path/query parameter or malformed upload
    pub fn bad_request() -> Self {
        Self::new(ErrorCode::BadRequest)
    }

    /// Known route, unsupported method
    pub fn method_not_allowed() -> Self {
        Self::new(ErrorCode::MethodNotAllowed)
    }

    /// Mutating call while the daemon is read-only
    pub fn read_only() -> Self {
        Self::new(ErrorCode::ReadOnly)
    }

    /// Internal error; the detail is logged, never sent to the caller
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError)
    }

    /// Printer rejected a command, message passed through verbatim
    pub fn operation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::OperationFailed, message)
    }

    /// Printer did not answer in time
    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }

        (status, Json(ApiResult::<()>::failure(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "not found");
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn test_operation_error_is_verbatim() {
        let err = AppError::operation("jammed");
        assert_eq!(err.code, ErrorCode::OperationFailed);
        assert_eq!(err.to_string(), "jammed");
        assert_eq!(err.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(AppError::bad_request().http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::read_only().message, "read only");
        assert_eq!(AppError::timeout().message, "operation timed out");
        assert_eq!(
            AppError::internal().http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
