//! # Query Features
//!
//! Turns a request's query parameters into one composed [`FindQuery`].
//!
//! Stages run in a fixed order: filter, sort, limit_fields, paginate. Each
//! stage consumes the pipeline and returns the narrowed one. Only
//! `paginate` touches the store, and only when `page` was given explicitly.

use std::sync::Arc;

use serde_json::{Number, Value};

use super::errors::{RestError, RestResult};
use super::parser::{ParamValue, QueryParams};
use crate::schema::{normalize_date, CollectionSchema, FieldKind, CREATED_AT_FIELD, VERSION_FIELD};
use crate::store::{
    Document, DocumentStore, Filter, FilterExpr, FilterOperator, FindQuery, Projection, SortKey,
    ID_FIELD,
};

/// Page used when `page` is absent or unusable
pub const DEFAULT_PAGE: usize = 1;

/// Page size used when `limit` is absent or unusable
pub const DEFAULT_LIMIT: usize = 100;

/// Message of the out-of-range page failure
pub const PAGE_NOT_FOUND: &str = "This page does not exist";

/// Query pipeline over one collection
pub struct QueryFeatures {
    store: Arc<dyn DocumentStore>,
    schema: Arc<dyn CollectionSchema>,
    params: QueryParams,
    query: FindQuery,
}

impl QueryFeatures {
    /// Start from "every document of the schema's collection"
    pub fn new(
        store: Arc<dyn DocumentStore>,
        schema: Arc<dyn CollectionSchema>,
        params: QueryParams,
    ) -> Self {
        Self {
            store,
            schema,
            params,
            query: FindQuery::all(),
        }
    }

    /// Every non-reserved parameter becomes a predicate.
    ///
    /// Values are cast to the field's declared type; an uncastable value is
    /// an invalid filter.
    pub fn filter(mut self) -> RestResult<Self> {
        let mut filter = Filter::new();

        for (field, value) in self.params.predicates() {
            let kind = self.schema.field_kind(field);
            match value {
                ParamValue::Single(raw) => {
                    let value = cast_operand(kind, field, FilterOperator::Eq, raw)?;
                    filter = filter.and(FilterExpr::eq(field, value));
                }
                ParamValue::Many(raws) => {
                    let values = raws
                        .iter()
                        .map(|raw| cast_operand(kind, field, FilterOperator::In, raw))
                        .collect::<RestResult<Vec<_>>>()?;
                    filter = filter.and(FilterExpr::in_list(field, values));
                }
                ParamValue::Operators(ops) => {
                    for (op, raw) in ops {
                        let operator = FilterOperator::from_comparison_suffix(op).ok_or_else(|| {
                            RestError::InvalidFilter(format!(
                                "unsupported operator '{}' on '{}'",
                                op, field
                            ))
                        })?;
                        let value = cast_operand(kind, field, operator, raw)?;
                        filter = filter.and(FilterExpr::new(field, operator, value));
                    }
                }
            }
        }

        self.query.filter = filter;
        Ok(self)
    }

    /// `sort=-ratingsAverage,price`; newest first when absent.
    pub fn sort(mut self) -> RestResult<Self> {
        let keys = match self.params.control("sort")? {
            Some(raw) => parse_sort(raw),
            None => Vec::new(),
        };

        self.query.sort = if keys.is_empty() {
            vec![SortKey::desc(CREATED_AT_FIELD)]
        } else {
            keys
        };
        Ok(self)
    }

    /// `fields=name,price` or `fields=-summary`; hides `__v` when absent.
    pub fn limit_fields(mut self) -> RestResult<Self> {
        let projection = match self.params.control("fields")? {
            Some(raw) => parse_fields(raw)?,
            None => None,
        };

        self.query.projection =
            projection.unwrap_or_else(|| Projection::exclude([VERSION_FIELD]));
        Ok(self)
    }

    /// Apply the skip/limit window.
    ///
    /// With an explicit `page`, a window starting past the end of the
    /// collection is reported as [`PAGE_NOT_FOUND`].
    pub async fn paginate(mut self) -> RestResult<Self> {
        let page_raw = self.params.control("page")?.map(str::to_string);
        let limit_raw = self.params.control("limit")?;

        let page = page_raw.as_deref().map_or(DEFAULT_PAGE, parse_page);
        let limit = limit_raw.map_or(DEFAULT_LIMIT, parse_limit);
        let skip = (page - 1).saturating_mul(limit);

        self.query.skip = skip;
        self.query.limit = Some(limit);

        if page_raw.is_some() {
            let total = self
                .store
                .count(self.schema.collection(), &Filter::new())
                .await?;
            if skip > total {
                return Err(RestError::NotFound(PAGE_NOT_FOUND.to_string()));
            }
        }

        Ok(self)
    }

    /// The composed, not yet executed query
    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Run the composed query once
    pub async fn execute(self) -> RestResult<Vec<Document>> {
        Ok(self.store.find(self.schema.collection(), &self.query).await?)
    }
}

/// Cast a raw operand to the declared type of `field`.
///
/// Undeclared fields fall back to [`coerce_value`], except that comparison
/// operators still require a number or a date.
pub fn cast_operand(
    kind: Option<FieldKind>,
    field: &str,
    operator: FilterOperator,
    raw: &str,
) -> RestResult<Value> {
    let cast_failed = |kind: FieldKind| {
        RestError::InvalidFilter(format!(
            "Cast to {} failed for value \"{}\" at path \"{}\"",
            kind.as_str(),
            raw,
            field
        ))
    };

    match kind {
        Some(FieldKind::String) => Ok(Value::String(raw.to_string())),
        Some(FieldKind::Number) => parse_number(raw).ok_or_else(|| cast_failed(FieldKind::Number)),
        Some(FieldKind::Date) => normalize_date(raw)
            .map(Value::String)
            .ok_or_else(|| cast_failed(FieldKind::Date)),
        None => {
            let value = coerce_value(raw);
            if matches!(operator, FilterOperator::Eq | FilterOperator::In) || value.is_number() {
                return Ok(value);
            }
            normalize_date(raw)
                .map(Value::String)
                .ok_or_else(|| cast_failed(FieldKind::Number))
        }
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Best-effort cast of a value for a field with no declared type.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => parse_number(raw).unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey::desc(field),
            None => SortKey::asc(part),
        })
        .collect()
}

fn parse_fields(raw: &str) -> RestResult<Option<Projection>> {
    let (excluded, included): (Vec<&str>, Vec<&str>) = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .partition(|part| part.starts_with('-'));
    let excluded: Vec<&str> = excluded.iter().map(|f| &f[1..]).collect();

    match (included.is_empty(), excluded.is_empty()) {
        (true, true) => Ok(None),
        (true, false) => Ok(Some(Projection::exclude(excluded))),
        (false, true) => Ok(Some(Projection::include(included))),
        (false, false) if excluded == [ID_FIELD] => Ok(Some(Projection::Include {
            fields: included.into_iter().map(String::from).collect(),
            with_id: false,
        })),
        (false, false) => Err(RestError::InvalidQueryParam(
            "fields cannot mix inclusion and exclusion".to_string(),
        )),
    }
}

/// Non-numeric, zero or negative pages fall back to the first page
fn parse_page(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n as usize,
        _ => DEFAULT_PAGE,
    }
}

/// Non-numeric or zero limits fall back to the default; negative limits
/// count by magnitude
fn parse_limit(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => DEFAULT_LIMIT,
        Ok(n) => n.unsigned_abs() as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TourSchema;
    use crate::store::{MemoryStore, SortDirection};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::parse(pairs.iter().map(|(k, v)| (*k, v.to_string()))).unwrap()
    }

    fn features(pairs: &[(&str, &str)]) -> QueryFeatures {
        QueryFeatures::new(
            Arc::new(MemoryStore::with_tours()),
            Arc::new(TourSchema),
            params(pairs),
        )
    }

    #[test]
    fn test_filter_drops_reserved_keys() {
        let f = features(&[
            ("difficulty", "easy"),
            ("price[gt]", "200"),
            ("sort", "-price"),
            ("limit", "2"),
            ("page", "1"),
            ("fields", "name"),
        ])
        .filter()
        .unwrap();

        assert_eq!(
            f.query().filter.to_document(),
            json!({"difficulty": "easy", "price": {"$gt": 200}})
        );
    }

    #[test]
    fn test_empty_params_match_all() {
        let f = features(&[]).filter().unwrap();
        assert!(f.query().filter.is_empty());
    }

    #[test]
    fn test_repeated_key_becomes_in_list() {
        let f = features(&[("difficulty", "easy"), ("difficulty", "medium")])
            .filter()
            .unwrap();

        let expr = &f.query().filter.filters[0];
        assert_eq!(expr.operator, FilterOperator::In);
        assert_eq!(expr.value, json!(["easy", "medium"]));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let result = features(&[("price[ne]", "5")]).filter();
        assert!(matches!(result, Err(RestError::InvalidFilter(_))));
    }

    #[test]
    fn test_sort_priority_list() {
        let f = features(&[("sort", "-ratingsAverage,price")]).sort().unwrap();
        assert_eq!(
            f.query().sort,
            vec![SortKey::desc("ratingsAverage"), SortKey::asc("price")]
        );
    }

    #[test]
    fn test_default_sort_newest_first() {
        let f = features(&[]).sort().unwrap();
        assert_eq!(f.query().sort.len(), 1);
        assert_eq!(f.query().sort[0].field, "createdAt");
        assert_eq!(f.query().sort[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_fields_allow_list() {
        let f = features(&[("fields", "name,price")]).limit_fields().unwrap();
        assert_eq!(f.query().projection, Projection::include(["name", "price"]));
    }

    #[test]
    fn test_default_projection_hides_version() {
        let f = features(&[]).limit_fields().unwrap();
        assert_eq!(f.query().projection, Projection::exclude(["__v"]));
    }

    #[test]
    fn test_fields_exclusion_and_mix() {
        let f = features(&[("fields", "-summary")]).limit_fields().unwrap();
        assert_eq!(f.query().projection, Projection::exclude(["summary"]));

        let result = features(&[("fields", "name,-summary")]).limit_fields();
        assert!(matches!(result, Err(RestError::InvalidQueryParam(_))));
    }

    #[tokio::test]
    async fn test_paginate_window() {
        let f = features(&[("page", "1"), ("limit", "10")]).paginate().await.unwrap();
        assert_eq!(f.query().skip, 0);
        assert_eq!(f.query().limit, Some(10));

        let f = features(&[]).paginate().await.unwrap();
        assert_eq!(f.query().skip, 0);
        assert_eq!(f.query().limit, Some(DEFAULT_LIMIT));
    }

    #[tokio::test]
    async fn test_paginate_past_end() {
        let result = features(&[("page", "3"), ("limit", "10")]).paginate().await;
        assert!(matches!(result, Err(RestError::NotFound(ref m)) if m == PAGE_NOT_FOUND));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(parse_page("abc"), DEFAULT_PAGE);
        assert_eq!(parse_page("-2"), DEFAULT_PAGE);
        assert_eq!(parse_page("3"), 3);
        assert_eq!(parse_limit("0"), DEFAULT_LIMIT);
        assert_eq!(parse_limit("-5"), 5);
        assert_eq!(parse_limit("x"), DEFAULT_LIMIT);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("5"), json!(5));
        assert_eq!(coerce_value("4.5"), json!(4.5));
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("null"), Value::Null);
        assert_eq!(coerce_value("easy"), json!("easy"));
    }

    #[test]
    fn test_operands_cast_to_declared_type() {
        let f = features(&[("name", "1234567890"), ("startDates[gte]", "2021-06-01")])
            .filter()
            .unwrap();

        assert_eq!(
            f.query().filter.to_document(),
            json!({
                "name": "1234567890",
                "startDates": {"$gte": "2021-06-01T00:00:00.000Z"}
            })
        );
    }

    #[test]
    fn test_uncastable_operand_rejected() {
        let result = features(&[("price[gt]", "abc")]).filter();
        assert!(matches!(result, Err(RestError::InvalidFilter(ref m)) if m.contains("Cast to Number")));

        let result = features(&[("duration", "long")]).filter();
        assert!(matches!(result, Err(RestError::InvalidFilter(_))));

        let result = features(&[("startDates[lt]", "someday")]).filter();
        assert!(matches!(result, Err(RestError::InvalidFilter(ref m)) if m.contains("Cast to Date")));
    }

    #[test]
    fn test_undeclared_field_comparison() {
        assert_eq!(
            cast_operand(None, "rank", FilterOperator::Gt, "3").unwrap(),
            json!(3)
        );
        assert_eq!(
            cast_operand(None, "rank", FilterOperator::Eq, "top").unwrap(),
            json!("top")
        );
        assert!(cast_operand(None, "rank", FilterOperator::Gt, "top").is_err());
    }
}
