//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the HTTP status code for this error code
    ///
    /// Transport-level problems (unknown printer, malformed request) map to
    /// 4xx. Errors reported by a connected printer stay at 200 and travel
    /// inside the envelope; existing API consumers rely on that.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::OperationFailed | Self::Timeout => StatusCode::OK,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ReadOnly => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
