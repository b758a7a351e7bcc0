//! tour-api entry point
//!
//! All logic is delegated to the CLI module.

use anyhow::Context;
use tour_api::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await.context("tour-api failed")
}
