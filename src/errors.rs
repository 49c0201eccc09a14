use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use thiserror::Error;

use crate::models::envelope::ApiResponse;

const RETRY_AFTER_SECS: u32 = 2;

#[derive(Debug, Error)]
pub enum QuotationError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} '{id}' was not found")]
    NotFound { entity: String, id: String },

    #[error("Request failed, please retry: {0}")]
    TransientNetwork(String),

    #[error("{0}")]
    StateInvariant(String),

    #[error("Invalid day: {0}")]
    InvalidDayKey(String),

    #[error("Settings storage error: {0}")]
    Storage(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl QuotationError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        QuotationError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        QuotationError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        QuotationError::StateInvariant(message.into())
    }

    /// Stable machine-readable tag carried in the failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            QuotationError::Validation { .. } => "VALIDATION_ERROR",
            QuotationError::NotFound { .. } => "NOT_FOUND",
            QuotationError::TransientNetwork(_) => "TRANSIENT_NETWORK_ERROR",
            QuotationError::StateInvariant(_) => "STATE_INVARIANT_ERROR",
            QuotationError::InvalidDayKey(_) => "INVALID_DAY_KEY",
            QuotationError::Storage(_) => "STORAGE_ERROR",
            QuotationError::Export(_) => "EXPORT_ERROR",
            QuotationError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Retryable failures carry a `Retry-After` header.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuotationError::TransientNetwork(_) | QuotationError::Database(_)
        )
    }

    fn public_message(&self) -> String {
        match self {
            QuotationError::Storage(_) => "Agency settings could not be saved".to_string(),
            QuotationError::Export(_) => "The document could not be generated".to_string(),
            QuotationError::Database(_) => "A database error occurred, please retry".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for QuotationError {
    fn status_code(&self) -> StatusCode {
        match self {
            QuotationError::Validation { .. } | QuotationError::InvalidDayKey(_) => {
                StatusCode::BAD_REQUEST
            }
            QuotationError::NotFound { .. } => StatusCode::NOT_FOUND,
            QuotationError::StateInvariant(_) => StatusCode::CONFLICT,
            QuotationError::TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
            QuotationError::Storage(_) | QuotationError::Export(_) | QuotationError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            QuotationError::Storage(_) | QuotationError::Export(_) | QuotationError::Database(_) => {
                log::error!("{}", self)
            }
            _ => log::warn!("{}", self),
        }

        let mut response = HttpResponse::build(self.status_code());
        if self.is_retryable() {
            response.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS.to_string()));
        }
        response.json(ApiResponse::<()>::failure(self.code(), self.public_message()))
    }
}

pub type Result<T> = std::result::Result<T, QuotationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_missing_destination_maps_to_404_envelope() {
        let error = QuotationError::not_found("Destination", "dest-9");
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let body = to_bytes(response.into_body()).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error"]["code"], "NOT_FOUND");
        assert_eq!(envelope["error"]["message"], "Destination 'dest-9' was not found");
    }

    #[test]
    fn test_transient_failures_ask_the_client_to_retry() {
        let response = QuotationError::TransientNetwork("timed out".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "2");
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let error = QuotationError::Export("fmt error".to_string());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "The document could not be generated");
    }
}
