//! # Document Value Helpers
//!
//! Field lookup and ordering rules shared by filtering, sorting and
//! aggregation.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// A stored document
pub type Document = Map<String, Value>;

/// Looks up a possibly dotted field path (`"location.city"`).
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Compares two values of the same kind.
///
/// Returns `None` when the kinds differ, so range predicates never match
/// across types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64()?;
            let b = b.as_f64()?;
            a.partial_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        (Value::Object(_), Value::Object(_)) => (a == b).then_some(Ordering::Equal),
        _ => None,
    }
}

/// Total order used for sorting.
///
/// Missing < null < bool < number < string < array < object; same kinds use
/// their natural order.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_across_representations() {
        assert_eq!(compare_values(&json!(497), &json!(497.0)), Some(Ordering::Equal));
        assert_eq!(compare_values(&json!(1.5), &json!(2)), Some(Ordering::Less));
    }

    #[test]
    fn test_mixed_kinds_are_incomparable() {
        assert_eq!(compare_values(&json!("200"), &json!(200)), None);
    }

    #[test]
    fn test_sort_order_puts_missing_first() {
        assert_eq!(sort_order(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(sort_order(Some(&json!(1)), Some(&json!("a"))), Ordering::Less);
        assert_eq!(sort_order(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
    }

    #[test]
    fn test_get_path() {
        let doc = json!({"a": {"b": 3}, "c": 1});
        let doc = doc.as_object().unwrap();
        assert_eq!(get_path(doc, "a.b"), Some(&json!(3)));
        assert_eq!(get_path(doc, "c"), Some(&json!(1)));
        assert_eq!(get_path(doc, "a.x"), None);
    }
}
