//! # Aggregation Pipeline
//!
//! A small, ordered set of document transformations evaluated by the store:
//! match, unwind, group with accumulators, add fields, project, sort, limit.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::{Map, Number, Value};

use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::query::{sort_documents, Projection, SortKey, ID_FIELD};
use super::value::{compare_values, get_path, Document};

/// One pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter
    Match(Filter),
    /// Emit one document per element of an array field
    Unwind(String),
    /// Collapse documents sharing a key into one output document
    Group {
        key: GroupKey,
        accumulators: Vec<Accumulator>,
    },
    /// Copy `source` path into `target` field
    AddFields(Vec<(String, String)>),
    Project(Projection),
    Sort(Vec<SortKey>),
    Limit(usize),
}

/// Grouping key; becomes the `_id` of each output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// Every document in one group
    Null,
    /// Raw field value
    Field(String),
    /// Upper-cased string field
    Upper(String),
    /// Month (1-12) of a date field
    Month(String),
}

/// Named per-group computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    pub name: String,
    pub op: AccumulatorOp,
}

impl Accumulator {
    pub fn new(name: impl Into<String>, op: AccumulatorOp) -> Self {
        Self {
            name: name.into(),
            op,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorOp {
    Count,
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
    Push(String),
}

#[derive(Debug)]
enum AccState {
    Count(u64),
    Sum { int: i64, float: f64, all_int: bool },
    Avg { total: f64, n: u64 },
    Extreme(Option<Value>),
    Push(Vec<Value>),
}

impl AccState {
    fn init(op: &AccumulatorOp) -> Self {
        match op {
            AccumulatorOp::Count => AccState::Count(0),
            AccumulatorOp::Sum(_) => AccState::Sum {
                int: 0,
                float: 0.0,
                all_int: true,
            },
            AccumulatorOp::Avg(_) => AccState::Avg { total: 0.0, n: 0 },
            AccumulatorOp::Min(_) | AccumulatorOp::Max(_) => AccState::Extreme(None),
            AccumulatorOp::Push(_) => AccState::Push(Vec::new()),
        }
    }

    fn feed(&mut self, op: &AccumulatorOp, doc: &Document) {
        match (self, op) {
            (AccState::Count(n), _) => *n += 1,
            (AccState::Sum { int, float, all_int }, AccumulatorOp::Sum(path)) => {
                if let Some(Value::Number(num)) = get_path(doc, path) {
                    match num.as_i64() {
                        Some(i) if *all_int => match int.checked_add(i) {
                            Some(total) => *int = total,
                            None => {
                                *float = *int as f64 + i as f64;
                                *all_int = false;
                            }
                        },
                        _ => {
                            if *all_int {
                                *float = *int as f64;
                                *all_int = false;
                            }
                            *float += num.as_f64().unwrap_or(0.0);
                        }
                    }
                }
            }
            (AccState::Avg { total, n }, AccumulatorOp::Avg(path)) => {
                if let Some(x) = get_path(doc, path).and_then(Value::as_f64) {
                    *total += x;
                    *n += 1;
                }
            }
            (AccState::Extreme(current), AccumulatorOp::Min(path) | AccumulatorOp::Max(path)) => {
                let Some(candidate) = get_path(doc, path).filter(|v| !v.is_null()) else {
                    return;
                };
                let want = if matches!(op, AccumulatorOp::Min(_)) {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Greater
                };
                let replace = match current {
                    None => true,
                    Some(existing) => compare_values(candidate, existing) == Some(want),
                };
                if replace {
                    *current = Some(candidate.clone());
                }
            }
            (AccState::Push(items), AccumulatorOp::Push(path)) => {
                if let Some(v) = get_path(doc, path) {
                    items.push(v.clone());
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Value {
        match self {
            AccState::Count(n) => Value::from(n),
            AccState::Sum { int, float, all_int } => {
                if all_int {
                    Value::from(int)
                } else {
                    float_value(float)
                }
            }
            AccState::Avg { total, n } => {
                if n == 0 {
                    Value::Null
                } else {
                    float_value(total / n as f64)
                }
            }
            AccState::Extreme(v) => v.unwrap_or(Value::Null),
            AccState::Push(items) => Value::Array(items),
        }
    }
}

fn float_value(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

fn month_of(value: &Value) -> StoreResult<Value> {
    let Value::String(s) = value else {
        return if value.is_null() {
            Ok(Value::Null)
        } else {
            Err(StoreError::Aggregation(format!(
                "can't convert {} to a date",
                value
            )))
        };
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Value::from(dt.month()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| Value::from(d.month()))
        .map_err(|_| StoreError::Aggregation(format!("can't convert '{}' to a date", s)))
}

impl GroupKey {
    fn evaluate(&self, doc: &Document) -> StoreResult<Value> {
        match self {
            GroupKey::Null => Ok(Value::Null),
            GroupKey::Field(path) => Ok(get_path(doc, path).cloned().unwrap_or(Value::Null)),
            GroupKey::Upper(path) => Ok(match get_path(doc, path) {
                Some(Value::String(s)) => Value::String(s.to_uppercase()),
                Some(other) => other.clone(),
                None => Value::Null,
            }),
            GroupKey::Month(path) => get_path(doc, path).map_or(Ok(Value::Null), month_of),
        }
    }
}

fn group(
    documents: Vec<Document>,
    key: &GroupKey,
    accumulators: &[Accumulator],
) -> StoreResult<Vec<Document>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<AccState>)> = Vec::new();

    for doc in &documents {
        let key_value = key.evaluate(doc)?;
        let slot = *index.entry(key_value.to_string()).or_insert_with(|| {
            groups.push((
                key_value.clone(),
                accumulators.iter().map(|a| AccState::init(&a.op)).collect(),
            ));
            groups.len() - 1
        });

        for (state, acc) in groups[slot].1.iter_mut().zip(accumulators) {
            state.feed(&acc.op, doc);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key_value, states)| {
            let mut out = Map::new();
            out.insert(ID_FIELD.to_string(), key_value);
            for (state, acc) in states.into_iter().zip(accumulators) {
                out.insert(acc.name.clone(), state.finish());
            }
            out
        })
        .collect())
}

fn unwind(documents: Vec<Document>, path: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        match doc.get(path) {
            Some(Value::Array(items)) => {
                for item in items.clone() {
                    let mut copy = doc.clone();
                    copy.insert(path.to_string(), item);
                    out.push(copy);
                }
            }
            Some(_) => out.push(doc),
            None => {}
        }
    }
    out
}

/// Evaluate a pipeline over a set of documents.
pub fn run(pipeline: &[Stage], mut documents: Vec<Document>) -> StoreResult<Vec<Document>> {
    for stage in pipeline {
        documents = match stage {
            Stage::Match(filter) => documents.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Unwind(path) => unwind(documents, path),
            Stage::Group { key, accumulators } => group(documents, key, accumulators)?,
            Stage::AddFields(fields) => documents
                .into_iter()
                .map(|mut doc| {
                    for (target, source) in fields {
                        let value = get_path(&doc, source).cloned().unwrap_or(Value::Null);
                        doc.insert(target.clone(), value);
                    }
                    doc
                })
                .collect(),
            Stage::Project(projection) => {
                documents.into_iter().map(|d| projection.apply(d)).collect()
            }
            Stage::Sort(keys) => {
                sort_documents(&mut documents, keys);
                documents
            }
            Stage::Limit(n) => {
                documents.truncate(*n);
                documents
            }
        };
    }
    Ok(documents)
}
