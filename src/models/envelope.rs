use serde::{Deserialize, Serialize};

use crate::errors::QuotationError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// `{ success, data | error }` envelope returned by every endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }

    /// Unwraps a received envelope. `success: false` is a recoverable error
    /// for the caller to surface, never a panic.
    pub fn into_result(self) -> Result<T, QuotationError> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(err)) => Err(match err.code.as_str() {
                "NOT_FOUND" => QuotationError::NotFound {
                    entity: "resource".to_string(),
                    id: err.message,
                },
                "VALIDATION_ERROR" => QuotationError::Validation {
                    field: "request".to_string(),
                    message: err.message,
                },
                "STATE_INVARIANT_ERROR" => QuotationError::StateInvariant(err.message),
                "INVALID_DAY_KEY" => QuotationError::InvalidDayKey(err.message),
                _ => QuotationError::TransientNetwork(err.message),
            }),
            _ => Err(QuotationError::TransientNetwork(
                "Response carried neither data nor error".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_is_recoverable() {
        let response: ApiResponse<String> = ApiResponse::failure("NOT_FOUND", "hotel-9");
        match response.into_result() {
            Err(QuotationError::NotFound { id, .. }) => assert_eq!(id, "hotel-9"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_failure_envelope_serializes_without_data() {
        let response: ApiResponse<u32> = ApiResponse::failure("VALIDATION_ERROR", "name: required");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_unknown_failure_maps_to_retryable_error() {
        let response: ApiResponse<u32> = ApiResponse::failure("DATABASE_ERROR", "timeout");
        assert!(response.into_result().unwrap_err().is_retryable());
    }
}
