//! Tours API Route Tests
//!
//! Drives the full router through `oneshot`:
//! - list pipeline (filter, sort, fields, pagination) over the seed data
//! - CRUD round trips and not-found handling
//! - aggregation reports
//! - uniform failure envelope for every error path

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tour_api::cli::{import_data, read_tours};
use tour_api::rest_api::{app, AppState};
use tour_api::store::{
    Document, DocumentStore, Filter, FindQuery, MemoryStore, Stage, StoreError, StoreResult,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn seed_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/dev-data/tours-simple.json"))
}

/// Backend whose every call fails, as an unreachable database would
struct UnavailableStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused by 10.0.0.7:27017".to_string())
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find(&self, _: &str, _: &FindQuery) -> StoreResult<Vec<Document>> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _: &str, _: &str) -> StoreResult<Option<Document>> {
        Err(unavailable())
    }

    async fn count(&self, _: &str, _: &Filter) -> StoreResult<usize> {
        Err(unavailable())
    }

    async fn insert(&self, _: &str, _: Value) -> StoreResult<Document> {
        Err(unavailable())
    }

    async fn update_by_id(&self, _: &str, _: &str, _: Value) -> StoreResult<Option<Document>> {
        Err(unavailable())
    }

    async fn delete_by_id(&self, _: &str, _: &str) -> StoreResult<Option<Document>> {
        Err(unavailable())
    }

    async fn aggregate(&self, _: &str, _: &[Stage]) -> StoreResult<Vec<Document>> {
        Err(unavailable())
    }
}

fn empty_app() -> Router {
    app(AppState::new(Arc::new(MemoryStore::with_tours())), false)
}

async fn seeded_app() -> Router {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::with_tours());
    import_data(store.as_ref(), read_tours(seed_path()).unwrap())
        .await
        .unwrap();
    app(AppState::new(store), false)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

fn names(body: &Value) -> Vec<&str> {
    body["data"]["tours"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

fn new_tour() -> Value {
    json!({
        "name": "The Desert Nomad",
        "duration": 6,
        "maxGroupSize": 12,
        "difficulty": "medium",
        "ratingsAverage": 4.6,
        "ratingsQuantity": 0,
        "price": 897,
        "summary": "Six nights under the desert sky",
        "images": [],
        "startDates": []
    })
}

// =============================================================================
// List Pipeline Tests
// =============================================================================

/// Filter, comparison operator, sort, limit and page compose into one query.
#[tokio::test]
async fn test_list_filter_sort_limit() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        "/api/v1/tours?difficulty=easy&price%5Bgt%5D=200&sort=-price&limit=2&page=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");
    assert_eq!(body["results"], 2);
    assert_eq!(names(&body), vec!["The Wine Taster", "The Northern Lights"]);
}

/// No parameters returns every tour, without the internal version field.
#[tokio::test]
async fn test_list_all_hides_version() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 9);
    for tour in body["data"]["tours"].as_array().unwrap() {
        assert!(tour.get("__v").is_none());
        assert!(tour.get("_id").is_some());
    }
}

/// Repeated filter keys match any of the given values.
#[tokio::test]
async fn test_repeated_filter_key() {
    let app = seeded_app().await;

    let (_, body) = get(&app, "/api/v1/tours?difficulty=easy&difficulty=medium").await;
    assert_eq!(body["results"], 7);
}

/// Field allow-list keeps only the named fields plus `_id`.
#[tokio::test]
async fn test_fields_allow_list() {
    let app = seeded_app().await;

    let (_, body) = get(&app, "/api/v1/tours?fields=name,price").await;

    for tour in body["data"]["tours"].as_array().unwrap() {
        let mut keys: Vec<&str> = tour.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["_id", "name", "price"]);
    }
}

/// Exclusion lists work; mixing inclusion and exclusion is rejected.
#[tokio::test]
async fn test_fields_exclusion() {
    let app = seeded_app().await;

    let (_, body) = get(&app, "/api/v1/tours?fields=-summary").await;
    let first = &body["data"]["tours"][0];
    assert!(first.get("summary").is_none());
    assert!(first.get("name").is_some());

    let (status, body) = get(&app, "/api/v1/tours?fields=name,-summary").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

/// Pages past the end of the collection are reported, not returned empty.
#[tokio::test]
async fn test_pagination_bounds() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours?page=2&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 4);

    // skip equals the collection size
    let (status, body) = get(&app, "/api/v1/tours?page=2&limit=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 0);

    let (status, body) = get(&app, "/api/v1/tours?page=3&limit=5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "This page does not exist"}));
}

/// Non-numeric page and limit fall back to their defaults.
#[tokio::test]
async fn test_pagination_coercion() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours?page=abc&limit=zero").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 9);
}

/// Unsupported operators and repeated control keys are client errors.
#[tokio::test]
async fn test_invalid_query_parameters() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours?price%5Bne%5D=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid filter"));

    let (status, body) = get(&app, "/api/v1/tours?sort=price&sort=name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid query parameter"));
}

/// Operands that cannot be cast to the field's type are rejected.
#[tokio::test]
async fn test_uncastable_filter_operand() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours?price%5Bgt%5D=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid filter: Cast to Number failed"));

    let (status, _) = get(&app, "/api/v1/tours?startDates%5Blt%5D=someday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Date operands are normalised before comparing with stored dates.
#[tokio::test]
async fn test_date_range_filter() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        "/api/v1/tours?startDates%5Bgte%5D=2023-01-01&fields=name",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["The Snow Adventurer"]);
}

/// The alias route applies its preset on top of the caller's filters.
#[tokio::test]
async fn test_top_five_cheap() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours/top-5-cheap").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 5);
    assert_eq!(
        names(&body)[..4],
        ["The Northern Lights", "The Park Camper", "The Sea Explorer", "The Forest Hiker"]
    );
    for tour in body["data"]["tours"].as_array().unwrap() {
        let mut keys: Vec<&str> = tour.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["_id", "difficulty", "name", "price", "ratingsAverage", "summary"]);
    }

    let (_, body) = get(&app, "/api/v1/tours/top-5-cheap?difficulty=difficult").await;
    assert_eq!(names(&body), vec!["The Sports Lover", "The Snow Adventurer"]);
}

// =============================================================================
// CRUD Tests
// =============================================================================

/// A created tour reads back with exactly the submitted fields.
#[tokio::test]
async fn test_create_then_get_round_trip() {
    let app = empty_app();
    let submitted = new_tour();

    let (status, body) = send(&app, Method::POST, "/api/v1/tours", Some(submitted.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Success");

    let id = body["data"]["tour"]["_id"].as_str().unwrap().to_string();
    let (status, body) = get(&app, &format!("/api/v1/tours/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    let fetched = &body["data"]["tour"];
    for (key, value) in submitted.as_object().unwrap() {
        assert_eq!(&fetched[key], value, "field {}", key);
    }
}

/// Fields the schema does not declare are not persisted.
#[tokio::test]
async fn test_create_drops_unknown_fields() {
    let app = empty_app();
    let mut submitted = new_tour();
    submitted["secretTour"] = json!(true);

    let (status, body) = send(&app, Method::POST, "/api/v1/tours", Some(submitted)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["tour"].get("secretTour").is_none());
}

/// Schema violations are a 400 carrying the validation message.
#[tokio::test]
async fn test_create_invalid_tour() {
    let app = empty_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tours",
        Some(json!({"name": "The Desert Nomad", "price": 897})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Tour validation failed"));
    assert!(message.contains("A tour must have a difficulty"));
}

/// Duplicate names are rejected.
#[tokio::test]
async fn test_create_duplicate_name() {
    let app = seeded_app().await;
    let mut submitted = new_tour();
    submitted["name"] = json!("The Forest Hiker");

    let (status, body) = send(&app, Method::POST, "/api/v1/tours", Some(submitted)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Duplicate field value"));
}

/// Malformed JSON bodies flow through the same failure envelope.
#[tokio::test]
async fn test_create_malformed_body() {
    let app = empty_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/tours")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "fail");
}

/// Partial updates merge into the stored tour and are re-validated.
#[tokio::test]
async fn test_update_tour() {
    let app = empty_app();
    let (_, body) = send(&app, Method::POST, "/api/v1/tours", Some(new_tour())).await;
    let id = body["data"]["tour"]["_id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/tours/{}", id);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"price": 950}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tour"]["price"], 950);
    assert_eq!(body["data"]["tour"]["name"], "The Desert Nomad");

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({"ratingsAverage": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/tours/000000000000000000000000",
        Some(json!({"price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No tour found with that ID");
}

/// Deleted tours are gone, never returned as an empty success.
#[tokio::test]
async fn test_delete_then_get() {
    let app = empty_app();
    let (_, body) = send(&app, Method::POST, "/api/v1/tours", Some(new_tour())).await;
    let uri = format!("/api/v1/tours/{}", body["data"]["tour"]["_id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// A well-formed identifier that matches nothing is a 404.
#[tokio::test]
async fn test_get_unknown_id() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours/000000000000000000000000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "No tour found with that ID"}));
}

/// A malformed identifier is a 400.
#[tokio::test]
async fn test_get_malformed_id() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "fail", "message": "Invalid _id: abc"}));
}

// =============================================================================
// Report Tests
// =============================================================================

/// Statistics group well-rated tours by difficulty, cheapest group first.
#[tokio::test]
async fn test_tour_stats() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours/stats").await;
    assert_eq!(status, StatusCode::OK);

    let stats = body["data"]["stats"].as_array().unwrap();
    let groups: Vec<&str> = stats.iter().map(|s| s["_id"].as_str().unwrap()).collect();
    assert_eq!(groups, vec!["EASY", "MEDIUM", "DIFFICULT"]);

    let easy = &stats[0];
    assert_eq!(easy["numTours"], 4);
    assert_eq!(easy["numRatings"], 159);
    assert_eq!(easy["avgPrice"], json!(1272.0));
    assert_eq!(easy["minPrice"], 397);
    assert_eq!(easy["maxPrice"], 1997);
}

/// The monthly plan counts departures per month of the requested year.
#[tokio::test]
async fn test_monthly_plan() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/api/v1/tours/monthly-plan/2021").await;
    assert_eq!(status, StatusCode::OK);

    let plan = body["data"]["plan"].as_array().unwrap();
    assert_eq!(plan.len(), 10);

    let busiest = &plan[0];
    assert_eq!(busiest["month"], 7);
    assert_eq!(busiest["numTourStarts"], 3);
    assert_eq!(
        busiest["tours"],
        json!(["The Forest Hiker", "The Sea Explorer", "The Sports Lover"])
    );
    assert!(busiest.get("_id").is_none());

    let (status, body) = get(&app, "/api/v1/tours/monthly-plan/next-year").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

// =============================================================================
// Fallback Tests
// =============================================================================

/// Unmatched paths get a 404 envelope naming the path.
#[tokio::test]
async fn test_unknown_route() {
    let app = empty_app();

    let (status, body) = get(&app, "/api/v1/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"status": "fail", "message": "Can't find /api/v1/nonexistent on this server!"})
    );
}

/// Unsupported methods on known paths get the same 404 envelope.
#[tokio::test]
async fn test_method_not_allowed() {
    let app = empty_app();

    let (status, body) = send(&app, Method::PUT, "/api/v1/tours", Some(json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Can't find /api/v1/tours on this server!");
}

// =============================================================================
// Store Failure Tests
// =============================================================================

/// Backend failures become a 500 whose detail never reaches the client.
#[tokio::test]
async fn test_store_failure_withholds_detail() {
    let app = app(AppState::new(Arc::new(UnavailableStore)), false);

    for uri in [
        "/api/v1/tours",
        "/api/v1/tours/stats",
        "/api/v1/tours/000000000000000000000000",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(
            body,
            json!({"status": "error", "message": "Something went very wrong!"})
        );
    }
}
