//! # Tours REST API Module
//!
//! HTTP endpoints for the tours resource: list with the query pipeline,
//! CRUD by id, two aggregation reports and the top-5-cheap alias.
//! Every failure flows through [`RestError`] into one response shape.

pub mod adapter;
pub mod alias;
pub mod errors;
pub mod features;
pub mod handler;
pub mod parser;
pub mod reports;
pub mod response;
pub mod server;

pub use alias::{ListPreset, TOP_FIVE_CHEAP};
pub use errors::{RestError, RestResult};
pub use features::QueryFeatures;
pub use handler::AppState;
pub use parser::{ParamValue, QueryParams};
pub use response::Envelope;
pub use server::{app, tour_routes, TOURS_PATH};
