//! CLI argument definitions using clap
//!
//! Commands:
//! - tour-api serve [--config <env-file>] [--seed <json>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tour API - REST service for browsing and managing tours
#[derive(Parser, Debug)]
#[command(name = "tour-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Env file loaded before reading configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON array of tours inserted before serving
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

impl Command {
    /// Env file named by the command, if any
    pub fn env_file(&self) -> Option<&PathBuf> {
        match self {
            Command::Serve { config, .. } => config.as_ref(),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
