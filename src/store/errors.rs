//! # Store Errors
//!
//! Error types raised by document store implementations.

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Identifier is not a well-formed object id
    #[error("Invalid _id: {0}")]
    InvalidId(String),

    /// Document violates the collection schema
    #[error(transparent)]
    Validation(#[from] SchemaError),

    /// Collection has no registered schema
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Aggregation pipeline could not be evaluated
    #[error("Invalid aggregation: {0}")]
    Aggregation(String),

    /// Backend is unreachable or misbehaving
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::InvalidId(_) | StoreError::Validation(_))
    }
}
