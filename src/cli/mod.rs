//! CLI module for the tour API
//!
//! Provides command-line interface for:
//! - serve: start the HTTP server, optionally seeded from a JSON file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{import_data, load_config, run, run_command, serve, DEFAULT_ENV_FILE};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::read_tours;
