//! # Tour Reports
//!
//! Read-only aggregation endpoints. Both bypass the query pipeline and hand
//! a fixed aggregation pipeline to the store.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use super::errors::{RestError, RestResult};
use super::handler::AppState;
use super::response::{Envelope, PlanData, StatsData};
use crate::schema::TOURS;
use crate::store::{
    Accumulator, AccumulatorOp, Filter, FilterExpr, GroupKey, Projection, SortKey, Stage, ID_FIELD,
};

/// Minimum rating for a tour to count towards the statistics
pub const STATS_MIN_RATING: f64 = 4.5;

/// Per-difficulty statistics over well-rated tours, cheapest group first
pub fn stats_pipeline() -> Vec<Stage> {
    vec![
        Stage::Match(
            Filter::new().and(FilterExpr::gte("ratingsAverage", json!(STATS_MIN_RATING))),
        ),
        Stage::Group {
            key: GroupKey::Upper("difficulty".to_string()),
            accumulators: vec![
                Accumulator::new("numTours", AccumulatorOp::Count),
                Accumulator::new("numRatings", AccumulatorOp::Sum("ratingsQuantity".into())),
                Accumulator::new("avgRating", AccumulatorOp::Avg("ratingsAverage".into())),
                Accumulator::new("avgPrice", AccumulatorOp::Avg("price".into())),
                Accumulator::new("minPrice", AccumulatorOp::Min("price".into())),
                Accumulator::new("maxPrice", AccumulatorOp::Max("price".into())),
            ],
        },
        Stage::Sort(vec![SortKey::asc("avgPrice")]),
    ]
}

/// Tour departures per month of `year`, busiest month first
pub fn monthly_plan_pipeline(year: i32) -> Vec<Stage> {
    let start = format!("{:04}-01-01T00:00:00.000Z", year);
    let end = format!("{:04}-01-01T00:00:00.000Z", year + 1);

    vec![
        Stage::Unwind("startDates".to_string()),
        Stage::Match(
            Filter::new()
                .and(FilterExpr::gte("startDates", json!(start)))
                .and(FilterExpr::lt("startDates", json!(end))),
        ),
        Stage::Group {
            key: GroupKey::Month("startDates".to_string()),
            accumulators: vec![
                Accumulator::new("numTourStarts", AccumulatorOp::Count),
                Accumulator::new("tours", AccumulatorOp::Push("name".into())),
            ],
        },
        Stage::AddFields(vec![("month".to_string(), ID_FIELD.to_string())]),
        Stage::Project(Projection::exclude([ID_FIELD])),
        Stage::Sort(vec![SortKey::desc("numTourStarts")]),
        Stage::Limit(12),
    ]
}

fn parse_year(raw: &str) -> RestResult<i32> {
    raw.parse::<i32>()
        .ok()
        .filter(|year| (1..=9998).contains(year))
        .ok_or_else(|| RestError::BadRequest(format!("Invalid year: {}", raw)))
}

/// `GET /api/v1/tours/stats`
pub async fn get_tour_stats(State(state): State<AppState>) -> RestResult<Json<Envelope<StatsData>>> {
    let stats = state.store.aggregate(TOURS, &stats_pipeline()).await?;
    Ok(Json(Envelope::success(StatsData { stats })))
}

/// `GET /api/v1/tours/monthly-plan/{year}`
pub async fn get_monthly_plan(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> RestResult<Json<Envelope<PlanData>>> {
    let year = parse_year(&year)?;
    let plan = state
        .store
        .aggregate(TOURS, &monthly_plan_pipeline(year))
        .await?;
    Ok(Json(Envelope::success(PlanData { plan })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021").unwrap(), 2021);
        assert!(matches!(parse_year("twenty"), Err(RestError::BadRequest(_))));
        assert!(parse_year("-4").is_err());
    }

    #[test]
    fn test_monthly_plan_bounds() {
        let pipeline = monthly_plan_pipeline(2021);
        let Stage::Match(filter) = &pipeline[1] else {
            panic!("expected match stage");
        };
        assert_eq!(
            filter.to_document(),
            json!({"startDates": {
                "$gte": "2021-01-01T00:00:00.000Z",
                "$lt": "2022-01-01T00:00:00.000Z"
            }})
        );
        assert_eq!(pipeline.last(), Some(&Stage::Limit(12)));
    }
}
