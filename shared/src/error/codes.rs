//! Error codes for the printerd control plane
//!
//! Codes are grouped by range:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 9xxx: System / device errors

use std::fmt;

/// Unified error code enum
///
/// The numeric value only shows up in logs (`E0003`); callers see the
/// envelope message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Printer (or other resource) not found
    NotFound = 3,
    /// Request parameters could not be validated
    BadRequest = 5,
    /// Route exists but not for this method
    MethodNotAllowed = 6,

    // ==================== 2xxx: Permission ====================
    /// Daemon runs in read-only mode
    ReadOnly = 2001,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// The printer rejected or failed a command
    OperationFailed = 9101,
    /// The printer did not answer within the operation timeout
    Timeout = 9102,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default envelope message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not found",
            ErrorCode::BadRequest => "bad request",
            ErrorCode::MethodNotAllowed => "method not allowed",
            ErrorCode::ReadOnly => "read only",
            ErrorCode::InternalError => "internal server error",
            ErrorCode::OperationFailed => "operation failed",
            ErrorCode::Timeout => "operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::ReadOnly.code(), 2001);
        assert_eq!(ErrorCode::OperationFailed.code(), 9101);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::InternalError.to_string(), "E9001");
    }

    #[test]
    fn test_envelope_messages() {
        assert_eq!(ErrorCode::NotFound.message(), "not found");
        assert_eq!(ErrorCode::BadRequest.message(), "bad request");
        assert_eq!(ErrorCode::MethodNotAllowed.message(), "method not allowed");
        assert_eq!(ErrorCode::InternalError.message(), "internal server error");
    }
}
