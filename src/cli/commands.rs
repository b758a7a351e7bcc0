//! CLI command implementations
//!
//! Each command loads configuration, installs logging and opens the store
//! before doing its own work. The store lives only as long as the process,
//! so seeding happens inside `serve`.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::read_tours;
use crate::http_server::{HttpServer, ServerConfig};
use crate::observability::{init_logging, LogFormat};
use crate::schema::TOURS;
use crate::store::DocumentStore;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command).await
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    let config = load_config(cmd.env_file().map(|p| p.as_path()))?;

    if let Err(e) = init_logging(LogFormat::for_environment(config.is_development())) {
        eprintln!("logging already initialised: {}", e);
    }

    let store = config.open_store()?;

    match cmd {
        Command::Serve { seed, .. } => serve(config, store, seed.as_deref()).await,
    }
}

/// Env file read when no `--config` is given, if present
pub const DEFAULT_ENV_FILE: &str = "config.env";

/// Load configuration, reading `env_file` into the environment first.
///
/// Without an explicit file, [`DEFAULT_ENV_FILE`] in the working directory
/// is used when present.
pub fn load_config(env_file: Option<&Path>) -> CliResult<ServerConfig> {
    match env_file {
        Some(path) => ServerConfig::load_env_file(path)?,
        None => {
            dotenvy::from_filename(DEFAULT_ENV_FILE).ok();
        }
    }
    Ok(ServerConfig::from_env()?)
}

/// Seed the store if asked, then serve until shutdown
pub async fn serve(
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
    seed: Option<&Path>,
) -> CliResult<()> {
    if let Some(path) = seed {
        import_data(store.as_ref(), read_tours(path)?).await?;
    }

    HttpServer::with_config(config, store)
        .start()
        .await
        .map_err(|e| CliError::boot_failed(e.to_string()))
}

/// Insert every tour, stopping at the first rejected one
pub async fn import_data(store: &dyn DocumentStore, tours: Vec<Value>) -> CliResult<usize> {
    let total = tours.len();

    for (i, tour) in tours.into_iter().enumerate() {
        store.insert(TOURS, tour).await.map_err(|e| {
            warn!(index = i, error = %e, "tour rejected");
            CliError::store_error(format!("tour #{}: {}", i, e))
        })?;
    }

    info!(count = total, "Data successfully loaded!");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Filter, MemoryStore};
    use serde_json::json;

    fn tour(name: &str) -> Value {
        json!({
            "name": name,
            "difficulty": "medium",
            "price": 497,
            "summary": "Imported during a CLI test"
        })
    }

    #[tokio::test]
    async fn test_import_counts_tours() {
        let store = MemoryStore::with_tours();

        let loaded = import_data(&store, vec![tour("The Sea Explorer"), tour("The Park Camper")])
            .await
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.count(TOURS, &Filter::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_stops_at_invalid_tour() {
        let store = MemoryStore::with_tours();

        let err = import_data(&store, vec![tour("The Sea Explorer"), json!({"name": "No price"})])
            .await
            .unwrap_err();
        assert!(err.message().starts_with("tour #1"));
        assert_eq!(store.count(TOURS, &Filter::new()).await.unwrap(), 1);
    }
}
