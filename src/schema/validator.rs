//! Collection schemas.
//!
//! A schema is owned by the store and consulted on every write:
//! - undeclared fields are dropped
//! - defaults are applied on insert only
//! - the whole resulting document is validated on insert and on update
//! - validation never coerces between types

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::errors::SchemaResult;
use crate::store::Document;

/// Insertion timestamp field
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Internal version field
pub const VERSION_FIELD: &str = "__v";

/// Declared type of a field (of each element, for array fields)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    /// Stored as a normalised timestamp string
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "String",
            FieldKind::Number => "Number",
            FieldKind::Date => "Date",
        }
    }
}

/// Rules a store enforces for one collection.
pub trait CollectionSchema: Send + Sync {
    /// Collection the schema governs
    fn collection(&self) -> &str;

    /// Declared type of `field`, `None` for undeclared fields
    fn field_kind(&self, field: &str) -> Option<FieldKind>;

    /// Fields whose values must be unique across the collection
    fn unique_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Turn a client-supplied body into a storable document.
    ///
    /// Applies defaults; rejects the body if any rule is violated.
    fn prepare_insert(&self, body: Value) -> SchemaResult<Document>;

    /// Validate the result of merging a partial update into a stored
    /// document. The returned document replaces the stored one.
    fn prepare_update(&self, merged: Document) -> SchemaResult<Document>;
}

/// Current time in the stored timestamp format
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// `2021-04-25T09:00:00.000Z`
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Normalise a date string to the stored timestamp format.
///
/// Accepts RFC 3339, `YYYY-MM-DD` and `YYYY-MM-DD,HH:MM`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(format_timestamp(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d,%H:%M") {
        return Some(format_timestamp(naive.and_utc()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| format_timestamp(naive.and_utc()))
}
