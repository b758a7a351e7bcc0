//! tour-api - a REST service for browsing and managing tours
//!
//! Layers, leaves first:
//! - `store`: document store seam, query model, in-memory backend
//! - `schema`: collection schemas enforced by the store on every write
//! - `rest_api`: query pipeline, handlers and the uniform envelope
//! - `http_server`: configuration and bootstrap
//! - `cli`: serve / import / delete commands

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod rest_api;
pub mod schema;
pub mod store;
