//! Observability
//!
//! Structured logging through `tracing`. Per-request spans are added by the
//! router when request logging is enabled.

pub mod logger;

pub use logger::{init as init_logging, LogFormat, DEFAULT_FILTER};
