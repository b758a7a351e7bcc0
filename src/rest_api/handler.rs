//! # Tour Handlers
//!
//! CRUD handlers for `/api/v1/tours`. Every handler returns
//! [`RestResult`]; failures are formatted by the central responder only.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::errors::{RestError, RestResult};
use super::features::QueryFeatures;
use super::parser::QueryParams;
use super::response::{Envelope, TourData, ToursData};
use crate::schema::{CollectionSchema, TourSchema, TOURS};
use crate::store::DocumentStore;

/// Message of the missing-tour failure
pub const TOUR_NOT_FOUND: &str = "No tour found with that ID";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Field types used to cast list filters
    pub tours: Arc<dyn CollectionSchema>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tours: Arc::new(TourSchema),
        }
    }
}

fn not_found() -> RestError {
    RestError::NotFound(TOUR_NOT_FOUND.to_string())
}

/// Decode the raw query string pairs
pub(super) fn query_params(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> RestResult<QueryParams> {
    let Query(pairs) = query?;
    QueryParams::parse(pairs)
}

/// Run the full pipeline and wrap the page in a list envelope
pub(super) async fn list_tours(
    state: &AppState,
    params: QueryParams,
) -> RestResult<Json<Envelope<ToursData>>> {
    let tours = QueryFeatures::new(state.store.clone(), state.tours.clone(), params)
        .filter()?
        .sort()?
        .limit_fields()?
        .paginate()
        .await?
        .execute()
        .await?;

    Ok(Json(Envelope::list(tours.len(), ToursData { tours })))
}

/// `GET /api/v1/tours`
pub async fn get_all_tours(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> RestResult<Json<Envelope<ToursData>>> {
    let params = query_params(query)?;
    list_tours(&state, params).await
}

/// `GET /api/v1/tours/{id}`
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RestResult<Json<Envelope<TourData>>> {
    let tour = state
        .store
        .find_by_id(TOURS, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(Envelope::success(TourData { tour })))
}

/// `POST /api/v1/tours`
pub async fn create_tour(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<(StatusCode, Json<Envelope<TourData>>)> {
    let Json(body) = body?;
    let tour = state.store.insert(TOURS, body).await?;

    Ok((StatusCode::CREATED, Json(Envelope::success(TourData { tour }))))
}

/// `PATCH /api/v1/tours/{id}`
pub async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<Json<Envelope<TourData>>> {
    let Json(patch) = body?;
    let tour = state
        .store
        .update_by_id(TOURS, &id, patch)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(Envelope::success(TourData { tour })))
}

/// `DELETE /api/v1/tours/{id}`
pub async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RestResult<StatusCode> {
    state
        .store
        .delete_by_id(TOURS, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(StatusCode::NO_CONTENT)
}
