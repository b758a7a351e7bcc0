//! # REST API Errors
//!
//! Error types for the REST API module, and the single place where a
//! failure becomes an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use super::response::Envelope;
use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// Message returned for every non-operational failure
pub const GENERIC_ERROR_MESSAGE: &str = "Something went very wrong!";

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Invalid or repeated control parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Invalid filter expression
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid request body
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Input rejected by the store (bad id, schema violation)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// No route matches the request
    #[error("Can't find {0} on this server!")]
    RouteNotFound(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Anything unexpected; the detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::RouteNotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error is expected and carries a client-safe message
    pub fn is_operational(&self) -> bool {
        !self.status_code().is_server_error()
    }

    /// Envelope status: "fail" for 4xx, "error" for 5xx
    pub fn status(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Message shown to the client
    pub fn client_message(&self) -> String {
        if self.is_operational() {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        if err.is_client_error() {
            RestError::BadRequest(err.to_string())
        } else {
            RestError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if !self.is_operational() {
            error!(error = %self, "request failed");
        }
        let body = Json(Envelope::failure(self.status(), self.client_message()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldViolation, SchemaError};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RestError::InvalidQueryParam("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RestError::NotFound("gone".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RestError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_status() {
        assert_eq!(RestError::NotFound("x".to_string()).status(), "fail");
        assert_eq!(RestError::Internal("x".to_string()).status(), "error");
    }

    #[test]
    fn test_internal_detail_withheld() {
        let err = RestError::Internal("connection refused".to_string());
        assert_eq!(err.client_message(), GENERIC_ERROR_MESSAGE);

        let err = RestError::RouteNotFound("/api/v1/nothing".to_string());
        assert_eq!(err.client_message(), "Can't find /api/v1/nothing on this server!");
    }

    #[test]
    fn test_store_error_mapping() {
        let err = RestError::from(StoreError::InvalidId("abc".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Invalid _id: abc");

        let schema = SchemaError::validation_failed(
            "Tour",
            vec![FieldViolation::new("name", "A tour must have a name")],
        );
        let err = RestError::from(StoreError::from(schema));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = RestError::from(StoreError::Unavailable("down".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
