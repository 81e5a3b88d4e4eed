//! # REST Errors
//!
//! Every failure ends up as a JSON envelope `{"type", "message"}`. `type` is
//! `LoginError` when the caller has to authenticate and `AppError` otherwise.
//! Envelopes go out with status 200 unless real status codes are enabled.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::query::QueryError;
use crate::store::{RecordKey, StoreError};

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestError {
    // ==================
    // Request Shape
    // ==================
    /// Malformed `/api/...` path
    #[error("{0}")]
    PathFormat(String),

    /// Body is not `application/json`
    #[error("Unsupported Content-Type: {0}")]
    ContentType(String),

    /// `params` queries and AND/OR composite filters
    #[error("{0}")]
    QueryUnsupported(String),

    /// Filter or order parameter does not follow the grammar
    #[error("{0}")]
    InvalidFilter(String),

    /// Query string could not be decoded, or `callback` is not an identifier
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Body is not a JSON object, or could not be read
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Body exceeds the configured limit
    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    /// URL id and body `Id` disagree
    #[error("Url id {{{url}}} must match object id {{{body}}}")]
    IdMismatch { url: String, body: String },

    #[error("Undefined method: {0}")]
    MethodNotAllowed(String),

    // ==================
    // Authorization
    // ==================
    /// No caller identity
    #[error("User must be logged in.")]
    LoginRequired,

    /// Caller is not among the record's owners
    #[error("Not an owner of {0}")]
    NotOwner(RecordKey),

    // ==================
    // Storage
    // ==================
    #[error("No model found with that Id: {0}")]
    NotFound(RecordKey),

    #[error("{0}")]
    Storage(StoreError),
}

impl RestError {
    /// Envelope `type`
    pub fn error_type(&self) -> &'static str {
        match self {
            RestError::LoginRequired => "LoginError",
            _ => "AppError",
        }
    }

    /// HTTP status used when status codes are enabled
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::PathFormat(_)
            | RestError::QueryUnsupported(_)
            | RestError::InvalidFilter(_)
            | RestError::InvalidQuery(_)
            | RestError::InvalidBody(_)
            | RestError::IdMismatch { .. } => StatusCode::BAD_REQUEST,
            RestError::ContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RestError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RestError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RestError::LoginRequired => StatusCode::UNAUTHORIZED,
            RestError::NotOwner(_) => StatusCode::FORBIDDEN,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a response, with status 200 or the mapped status
    pub fn into_response_with(self, http_status: bool) -> Response {
        let status = if http_status {
            self.status_code()
        } else {
            StatusCode::OK
        };
        (status, Json(ErrorEnvelope::from(&self))).into_response()
    }
}

impl From<QueryError> for RestError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::CompositeUnsupported(_) | QueryError::ParamsUnsupported => {
                RestError::QueryUnsupported(err.to_string())
            }
            QueryError::InvalidFilter(_) | QueryError::InvalidOrder(_) => {
                RestError::InvalidFilter(err.to_string())
            }
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => RestError::NotFound(key),
            other => RestError::Storage(other),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub message: String,
}

impl From<&RestError> for ErrorEnvelope {
    fn from(err: &RestError) -> Self {
        Self {
            error_type: err.error_type(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordId;

    #[test]
    fn test_error_types() {
        assert_eq!(RestError::LoginRequired.error_type(), "LoginError");
        assert_eq!(
            RestError::NotOwner(RecordKey::new("a", RecordId::Numeric(1))).error_type(),
            "AppError"
        );
        assert_eq!(RestError::PathFormat("x".into()).error_type(), "AppError");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RestError::LoginRequired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            RestError::NotFound(RecordKey::new("a", RecordId::Numeric(1))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RestError::ContentType("text/plain".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            RestError::BodyTooLarge("limit".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = ErrorEnvelope::from(&RestError::LoginRequired);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "LoginError", "message": "User must be logged in."})
        );
    }

    #[test]
    fn test_id_mismatch_message() {
        let err = RestError::IdMismatch {
            url: "5".into(),
            body: "6".into(),
        };
        assert_eq!(err.to_string(), "Url id {5} must match object id {6}");
    }

    #[test]
    fn test_query_error_conversion() {
        assert!(matches!(
            RestError::from(QueryError::ParamsUnsupported),
            RestError::QueryUnsupported(_)
        ));
        assert!(matches!(
            RestError::from(QueryError::InvalidFilter("x".into())),
            RestError::InvalidFilter(_)
        ));
    }

    #[test]
    fn test_store_error_conversion() {
        let key = RecordKey::new("a", RecordId::Numeric(1));
        assert_eq!(
            RestError::from(StoreError::NotFound(key.clone())),
            RestError::NotFound(key)
        );
        assert!(matches!(
            RestError::from(StoreError::Backend("x".into())),
            RestError::Storage(_)
        ));
    }
}
