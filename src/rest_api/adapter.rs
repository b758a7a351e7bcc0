//! # Failure Adapter
//!
//! Funnels failures that never reach a handler's `Result` into
//! [`RestError`]: extractor rejections, panics and unmatched routes.

use std::any::Any;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::OriginalUri;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use super::errors::RestError;

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        RestError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for RestError {
    fn from(rejection: QueryRejection) -> Self {
        RestError::InvalidQueryParam(rejection.body_text())
    }
}

/// Turn a panicking handler into the generic 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    RestError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Fallback for unmatched paths and methods.
///
/// Nested routers see a stripped `Uri`, so the original request target is
/// reported.
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> RestError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    RestError::RouteNotFound(target)
}
