//! # Query Parameter Parser
//!
//! Structures a decoded query string into a parameter mapping. Bracketed
//! keys (`price[gt]=200`) become operator maps; repeated plain keys become
//! lists. Interpreting the mapping is left to the query pipeline.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::errors::{RestError, RestResult};

/// Control keys consumed by the pipeline rather than turned into predicates
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Value of one query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `difficulty=easy`
    Single(String),
    /// `difficulty=easy&difficulty=medium`
    Many(Vec<String>),
    /// `price[gt]=200&price[lt]=900`
    Operators(BTreeMap<String, String>),
}

/// Parsed query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

/// `field` or `field[op]`, one bracket level at most
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\[\]]+)(?:\[([^\[\]]+)\])?$").expect("valid key pattern"));

impl QueryParams {
    /// Parse decoded `(key, value)` pairs in query-string order
    pub fn parse<I, K, V>(pairs: I) -> RestResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = QueryParams::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            if key.is_empty() {
                continue;
            }

            let captures = KEY_PATTERN
                .captures(key)
                .ok_or_else(|| RestError::InvalidFilter(format!("unsupported parameter '{}'", key)))?;
            let field = &captures[1];
            let value = value.into();

            match captures.get(2) {
                Some(op) => params.push_operator(field, op.as_str(), value)?,
                None => params.push_value(field, value)?,
            }
        }

        Ok(params)
    }

    fn push_value(&mut self, field: &str, value: String) -> RestResult<()> {
        match self.entries.entry(field.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(ParamValue::Single(value));
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                ParamValue::Single(first) => {
                    let first = std::mem::take(first);
                    entry.insert(ParamValue::Many(vec![first, value]));
                }
                ParamValue::Many(values) => values.push(value),
                ParamValue::Operators(_) => {
                    return Err(RestError::InvalidFilter(format!(
                        "'{}' mixes a value with operators",
                        field
                    )))
                }
            },
        }
        Ok(())
    }

    fn push_operator(&mut self, field: &str, op: &str, value: String) -> RestResult<()> {
        let entry = self
            .entries
            .entry(field.to_string())
            .or_insert_with(|| ParamValue::Operators(BTreeMap::new()));

        let ParamValue::Operators(ops) = entry else {
            return Err(RestError::InvalidFilter(format!(
                "'{}' mixes a value with operators",
                field
            )));
        };
        if ops.insert(op.to_string(), value).is_some() {
            return Err(RestError::InvalidFilter(format!(
                "operator '{}' repeated on '{}'",
                op, field
            )));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Set a single value, replacing whatever the key held
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), ParamValue::Single(value.into()));
    }

    /// Value of a control key, which must appear at most once
    pub fn control(&self, key: &str) -> RestResult<Option<&str>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(ParamValue::Single(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(RestError::InvalidQueryParam(format!(
                "'{}' must be given once, as a plain value",
                key
            ))),
        }
    }

    /// Every non-reserved parameter
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }
}
