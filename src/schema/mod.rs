//! Schema subsystem
//!
//! Schemas are enforced by the store at write time.
//!
//! # Design Principles
//!
//! - Mandatory on all writes
//! - Undeclared fields are dropped, never stored
//! - Defaults apply on insert only
//! - No type coercion
//! - Every violation is reported, not just the first

mod errors;
mod tour;
mod validator;

pub use errors::{FieldViolation, SchemaError, SchemaResult};
pub use tour::{Difficulty, Tour, TourSchema, TOURS};
pub use validator::{
    format_timestamp, normalize_date, now_timestamp, CollectionSchema, FieldKind,
    CREATED_AT_FIELD, VERSION_FIELD,
};
