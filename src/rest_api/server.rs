//! # REST API Router
//!
//! Axum routes for the tours resource plus the layers every request passes
//! through.

use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::adapter::{handle_panic, route_not_found};
use super::alias::top_five_cheap;
use super::handler::{
    create_tour, delete_tour, get_all_tours, get_tour, update_tour, AppState,
};
use super::reports::{get_monthly_plan, get_tour_stats};

/// Prefix of the tours resource
pub const TOURS_PATH: &str = "/api/v1/tours";

/// Routes relative to [`TOURS_PATH`]
pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_tours).post(create_tour))
        .route("/top-5-cheap", get(top_five_cheap))
        .route("/stats", get(get_tour_stats))
        .route("/monthly-plan/{year}", get(get_monthly_plan))
        .route(
            "/{id}",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .method_not_allowed_fallback(route_not_found)
}

/// Full application router.
///
/// `request_logging` adds a per-request trace span.
pub fn app(state: AppState, request_logging: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .nest(TOURS_PATH, tour_routes())
        .fallback(route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors);

    if request_logging {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
    } else {
        router
    }
}
