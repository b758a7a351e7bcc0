//! # Alias Routes
//!
//! Specialised list views expressed as fixed parameter overrides on top of
//! the caller's own parameters.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use super::errors::RestResult;
use super::handler::{list_tours, query_params, AppState};
use super::parser::QueryParams;
use super::response::{Envelope, ToursData};

/// Parameter overrides of an alias route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPreset {
    pub limit: usize,
    pub sort: &'static str,
    pub fields: &'static str,
}

/// Five best-rated tours, cheapest first among equals
pub const TOP_FIVE_CHEAP: ListPreset = ListPreset {
    limit: 5,
    sort: "-ratingsAverage,price",
    fields: "name,price,ratingsAverage,summary,difficulty",
};

impl ListPreset {
    /// Overlay the preset; caller filters and `page` are kept
    pub fn apply(&self, mut params: QueryParams) -> QueryParams {
        params.set("limit", self.limit.to_string());
        params.set("sort", self.sort);
        params.set("fields", self.fields);
        params
    }
}

/// `GET /api/v1/tours/top-5-cheap`
pub async fn top_five_cheap(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> RestResult<Json<Envelope<ToursData>>> {
    let params = TOP_FIVE_CHEAP.apply(query_params(query)?);
    list_tours(&state, params).await
}
