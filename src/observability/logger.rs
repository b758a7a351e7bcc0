//! Process-wide logging setup
//!
//! All crate code logs through `tracing` macros. This module installs the
//! subscriber once at startup:
//! - filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
//! - one JSON object per line in production
//! - human-readable lines in development

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "tour_api=info,tower_http=info";

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON, one event per line
    Json,
    /// Human-readable, for local development
    Pretty,
}

impl LogFormat {
    /// Format matching an environment flag
    pub fn for_environment(development: bool) -> Self {
        if development {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(format: LogFormat) -> Result<(), TryInitError> {
    let json = (format == LogFormat::Json).then(|| fmt::layer().json().with_current_span(false));
    let pretty = (format == LogFormat::Pretty).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(env_filter())
        .with(json)
        .with(pretty)
        .try_init()
}
