//! Schema error types
//!
//! A rejected document reports every violated field at once, in the order
//! the fields were checked.

use std::fmt;

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// One violated field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field path (e.g., "startDates.1")
    pub field: String,
    /// Client-facing description of the rule
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Schema errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Document violates one or more field rules
    #[error("{model} validation failed: {}", join(.violations))]
    ValidationFailed {
        model: String,
        violations: Vec<FieldViolation>,
    },

    /// Unique field already taken by another document
    #[error("Duplicate field value: {field} = {value}. Please use another value")]
    Duplicate { field: String, value: String },

    /// Attempt to change a field that is fixed after insert
    #[error("Performing an update on the path '{0}' would modify an immutable field")]
    Immutable(String),
}

impl SchemaError {
    pub fn validation_failed(model: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        SchemaError::ValidationFailed {
            model: model.into(),
            violations,
        }
    }

    /// Violations carried by the error, empty for non-validation failures
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            SchemaError::ValidationFailed { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
