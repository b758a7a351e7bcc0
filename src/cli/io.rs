//! Seed file handling
//!
//! A seed file is a UTF-8 JSON array of tour objects.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON array of tours
pub fn read_tours(path: &Path) -> CliResult<Vec<Value>> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))?;

    match serde_json::from_str(&text)? {
        Value::Array(tours) => Ok(tours),
        _ => Err(CliError::io_error(format!(
            "{}: expected a JSON array of tours",
            path.display()
        ))),
    }
}
