//! # Filter Expressions
//!
//! Store-native predicates. A [`Filter`] is a conjunction of
//! [`FilterExpr`]s, each comparing one document field against a value.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::{compare_values, get_path, Document};

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equals
    #[serde(rename = "eq")]
    Eq,

    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Greater than or equal
    #[serde(rename = "gte")]
    Gte,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Less than or equal
    #[serde(rename = "lte")]
    Lte,

    /// Value in list
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
        }
    }

    /// Parse one of the comparison suffixes accepted in query strings
    pub fn from_comparison_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            _ => None,
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            FilterOperator::Eq | FilterOperator::In => ordering == Ordering::Equal,
            FilterOperator::Gt => ordering == Ordering::Greater,
            FilterOperator::Gte => ordering != Ordering::Less,
            FilterOperator::Lt => ordering == Ordering::Less,
            FilterOperator::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a greater than filter
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    /// Create a greater than or equal filter
    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gte, value)
    }

    /// Create a less than filter
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Lte, value)
    }

    /// Create an "in list" filter
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Check if a document matches this filter.
    ///
    /// Array fields match when any element matches, unless the operand is
    /// itself an array compared for equality.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(field_value) = get_path(doc, &self.field) else {
            return self.operator == FilterOperator::Eq && self.value.is_null();
        };

        if self.matches_value(field_value) {
            return true;
        }

        match field_value {
            Value::Array(items) => items.iter().any(|item| self.matches_value(item)),
            _ => false,
        }
    }

    fn matches_value(&self, candidate: &Value) -> bool {
        match self.operator {
            FilterOperator::In => self
                .value
                .as_array()
                .map(|options| {
                    options
                        .iter()
                        .any(|option| compare_values(candidate, option) == Some(Ordering::Equal))
                })
                .unwrap_or(false),
            op => compare_values(candidate, &self.value)
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false),
        }
    }
}

/// A set of filters combined with AND logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub filters: Vec<FilterExpr>,
}

impl Filter {
    /// Match-all filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check if a document matches all filters
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Render as a Mongo-style query document.
    ///
    /// Equality renders as the bare value, comparisons nest under their
    /// `$`-prefixed operator: `{"price": {"$gt": 200}}`.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for expr in &self.filters {
            if expr.operator == FilterOperator::Eq {
                doc.insert(expr.field.clone(), expr.value.clone());
                continue;
            }

            let entry = doc
                .entry(expr.field.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(ops) = entry {
                ops.insert(format!("${}", expr.operator.as_str()), expr.value.clone());
            }
        }
        Value::Object(doc)
    }
}
