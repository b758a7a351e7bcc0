//! Tour schema.
//!
//! Declared fields, defaults and validation rules for the `tours`
//! collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::{FieldViolation, SchemaError, SchemaResult};
use super::validator::{
    normalize_date, now_timestamp, CollectionSchema, FieldKind, CREATED_AT_FIELD, VERSION_FIELD,
};
use crate::store::{Document, ID_FIELD};

/// Collection name
pub const TOURS: &str = "tours";

const MODEL: &str = "Tour";

const FIELDS: &[(&str, FieldKind)] = &[
    (ID_FIELD, FieldKind::String),
    ("name", FieldKind::String),
    ("duration", FieldKind::Number),
    ("maxGroupSize", FieldKind::Number),
    ("difficulty", FieldKind::String),
    ("ratingsAverage", FieldKind::Number),
    ("ratingsQuantity", FieldKind::Number),
    ("price", FieldKind::Number),
    ("priceDiscount", FieldKind::Number),
    ("summary", FieldKind::String),
    ("description", FieldKind::String),
    ("imageCover", FieldKind::String),
    ("images", FieldKind::String),
    ("startDates", FieldKind::Date),
    (CREATED_AT_FIELD, FieldKind::Date),
    (VERSION_FIELD, FieldKind::Number),
];

const TRIMMED_FIELDS: &[&str] = &["name", "summary", "description", "imageCover"];

const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("name", "A tour must have a name"),
    ("difficulty", "A tour must have a difficulty"),
    ("price", "A tour must have a price"),
    ("summary", "A tour must have a summary"),
];

const NAME_MIN_LEN: usize = 10;
const NAME_MAX_LEN: usize = 40;

/// Tour difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Difficult];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown difficulty '{}'", s))
    }
}

/// Typed view of a stored tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_group_size: Option<f64>,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: f64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "__v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Schema for the `tours` collection
#[derive(Debug, Clone, Copy, Default)]
pub struct TourSchema;

impl TourSchema {
    fn validate(&self, mut doc: Document) -> SchemaResult<Document> {
        let mut violations = Vec::new();

        for field in TRIMMED_FIELDS {
            if let Some(Value::String(s)) = doc.get_mut(*field) {
                *s = s.trim().to_string();
            }
        }

        for (field, message) in REQUIRED_FIELDS {
            if doc.get(*field).map_or(true, Value::is_null) {
                violations.push(FieldViolation::new(*field, *message));
            }
        }

        if let Some(Value::String(d)) = doc.get("difficulty") {
            if d.parse::<Difficulty>().is_err() {
                violations.push(FieldViolation::new(
                    "difficulty",
                    "Difficulty is either: easy, medium, difficult",
                ));
            }
        }

        if let Some(Value::Array(dates)) = doc.get_mut("startDates") {
            for (i, date) in dates.iter_mut().enumerate() {
                match date.as_str().and_then(normalize_date) {
                    Some(normalized) => *date = Value::String(normalized),
                    None => violations.push(FieldViolation::new(
                        format!("startDates.{}", i),
                        format!("Cast to date failed for value {}", date),
                    )),
                }
            }
        }

        if !violations.is_empty() {
            return Err(SchemaError::validation_failed(MODEL, violations));
        }

        let tour: Tour = serde_path_to_error::deserialize(Value::Object(doc.clone())).map_err(|e| {
            let field = e.path().to_string();
            SchemaError::validation_failed(MODEL, vec![FieldViolation::new(field, e.inner().to_string())])
        })?;

        let name_len = tour.name.chars().count();
        if name_len > NAME_MAX_LEN {
            violations.push(FieldViolation::new(
                "name",
                format!("A tour name must have less or equal then {} characters", NAME_MAX_LEN),
            ));
        } else if name_len < NAME_MIN_LEN {
            violations.push(FieldViolation::new(
                "name",
                format!("A tour name must have more or equal then {} characters", NAME_MIN_LEN),
            ));
        }
        if !(1.0..=5.0).contains(&tour.ratings_average) {
            violations.push(FieldViolation::new(
                "ratingsAverage",
                "Rating must be between 1.0 and 5.0",
            ));
        }
        if tour.ratings_quantity < 0.0 {
            violations.push(FieldViolation::new("ratingsQuantity", "Must not be negative"));
        }
        if tour.price < 0.0 {
            violations.push(FieldViolation::new("price", "Must not be negative"));
        }
        if let Some(discount) = tour.price_discount {
            if discount >= tour.price {
                violations.push(FieldViolation::new(
                    "priceDiscount",
                    format!("Discount price ({}) should be below regular price", discount),
                ));
            }
        }

        if violations.is_empty() {
            Ok(doc)
        } else {
            Err(SchemaError::validation_failed(MODEL, violations))
        }
    }
}

impl CollectionSchema for TourSchema {
    fn collection(&self) -> &str {
        TOURS
    }

    fn field_kind(&self, field: &str) -> Option<FieldKind> {
        FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    fn unique_fields(&self) -> &[&'static str] {
        &["name"]
    }

    fn prepare_insert(&self, body: Value) -> SchemaResult<Document> {
        let Value::Object(body) = body else {
            return Err(SchemaError::validation_failed(
                MODEL,
                vec![FieldViolation::new("$root", "must be a JSON object")],
            ));
        };

        let mut doc: Document = body
            .into_iter()
            .filter(|(k, _)| self.field_kind(k).is_some())
            .filter(|(k, _)| k != CREATED_AT_FIELD && k != VERSION_FIELD)
            .collect();

        doc.entry("ratingsAverage").or_insert_with(|| json!(4.5));
        doc.entry("ratingsQuantity").or_insert_with(|| json!(0));
        doc.entry("images").or_insert_with(|| json!([]));
        doc.entry("startDates").or_insert_with(|| json!([]));
        doc.insert(CREATED_AT_FIELD.to_string(), Value::String(now_timestamp()));

        self.validate(doc)
    }

    fn prepare_update(&self, merged: Document) -> SchemaResult<Document> {
        let doc = merged
            .into_iter()
            .filter(|(k, _)| self.field_kind(k).is_some())
            .collect();
        self.validate(doc)
    }
}
