//! Unified error system for printerd
//!
//! - [`ErrorCode`]: standardized error codes with HTTP status mapping
//! - [`AppError`]: error carrying a code and the envelope message
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::not_found();
//! assert_eq!(err.code, ErrorCode::NotFound);
//!
//! // Device errors keep the printer's own message
//! let err = AppError::operation("jammed");
//! assert_eq!(err.to_string(), "jammed");
//! ```

mod codes;
mod http;
mod types;

pub use codes::ErrorCode;
pub use types::{AppError, AppResult};
