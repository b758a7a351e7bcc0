//! # HTTP Server Module
//!
//! Configuration and bootstrap for the tours API server.
//!
//! # Endpoints
//!
//! - `/api/v1/tours` - list and create
//! - `/api/v1/tours/{id}` - read, update, delete
//! - `/api/v1/tours/top-5-cheap` - preset list
//! - `/api/v1/tours/stats` - statistics by difficulty
//! - `/api/v1/tours/monthly-plan/{year}` - departures per month

pub mod config;
pub mod server;

pub use config::{ConfigError, Environment, ServerConfig};
pub use server::{shutdown_signal, HttpServer};
