//! API Response types
//!
//! The single response envelope shared by every JSON endpoint.

use serde::{Deserialize, Serialize};

/// Response envelope
///
/// Both keys are always present, in this order:
/// ```json
/// { "result": <any|null>, "error": <string|null> }
/// ```
/// Exactly one of them is meaningful per response; `error` is `null` on
/// success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult<T> {
    /// Payload (null on failure)
    pub result: Option<T>,
    /// Error message (null on success)
    pub error: Option<String>,
}

impl<T> ApiResult<T> {
    /// Successful response carrying `result`
    pub fn success(result: T) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    /// Failed response carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
        }
    }

    /// Check if the envelope carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Convert into a plain `Result`
    ///
    /// A success envelope whose payload is `null` yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResult<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_string(&ApiResult::success(true)).unwrap();
        assert_eq!(json, r#"{"result":true,"error":null}"#);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let json = serde_json::to_string(&ApiResult::<bool>::failure("not found")).unwrap();
        assert_eq!(json, r#"{"result":null,"error":"not found"}"#);
    }

    #[test]
    fn test_null_payload_success() {
        let json = serde_json::to_string(&ApiResult::<u32> {
            result: None,
            error: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"result":null,"error":null}"#);
    }

    #[test]
    fn test_into_result() {
        let ok: ApiResult<u32> = serde_json::from_str(r#"{"result":7,"error":null}"#).unwrap();
        assert_eq!(ok.into_result(), Ok(Some(7)));

        let err: ApiResult<u32> =
            serde_json::from_str(r#"{"result":null,"error":"jammed"}"#).unwrap();
        assert!(err.is_error());
        assert_eq!(err.into_result(), Err("jammed".to_string()));
    }
}
