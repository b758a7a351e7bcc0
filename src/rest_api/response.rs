//! # Response Formatting
//!
//! Every response body, success or failure, is an [`Envelope`]:
//! `{status, results?, data?, message?}`.

use serde::Serialize;

use crate::store::Document;

/// Status of every successful envelope
pub const SUCCESS: &str = "Success";

/// Uniform response envelope
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: SUCCESS,
            results: None,
            data: Some(data),
            message: None,
        }
    }

    /// Success envelope carrying a result count
    pub fn list(results: usize, data: T) -> Self {
        Self {
            results: Some(results),
            ..Self::success(data)
        }
    }
}

impl Envelope<()> {
    pub fn failure(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            results: None,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// `data` of single-tour responses
#[derive(Debug, Clone, Serialize)]
pub struct TourData {
    pub tour: Document,
}

/// `data` of tour list responses
#[derive(Debug, Clone, Serialize)]
pub struct ToursData {
    pub tours: Vec<Document>,
}

/// `data` of the difficulty statistics report
#[derive(Debug, Clone, Serialize)]
pub struct StatsData {
    pub stats: Vec<Document>,
}

/// `data` of the monthly plan report
#[derive(Debug, Clone, Serialize)]
pub struct PlanData {
    pub plan: Vec<Document>,
}
