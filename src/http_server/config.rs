//! HTTP Server Configuration
//!
//! Host, port, store connection and environment flag, read from process
//! environment variables. An env file, when given, is loaded into the
//! process environment first.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::store::{DocumentStore, MemoryStore};

/// Placeholder in `DATABASE` replaced by `DATABASE_PASSWORD`
pub const PASSWORD_PLACEHOLDER: &str = "<PASSWORD>";

/// Scheme of the bundled in-memory store
pub const MEMORY_SCHEME: &str = "memory://";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid PORT '{0}': expected an integer between 0 and 65535")]
    InvalidPort(String),

    #[error("Unsupported database scheme '{0}': only memory:// is available")]
    UnsupportedDatabase(String),

    #[error("DATABASE names no database after the scheme")]
    MissingDatabaseName,

    #[error("DATABASE contains <PASSWORD> but DATABASE_PASSWORD is not set")]
    MissingPassword,

    #[error("Failed to load env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Anything other than `development` is production
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Host name or address to bind to (default: "0.0.0.0")
    pub host: String,

    /// Port to bind to (default: 9000)
    pub port: u16,

    /// Store connection string (default: "memory://tours")
    pub database: String,

    pub database_password: String,

    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            database: format!("{}tours", MEMORY_SCHEME),
            database_password: String::new(),
            environment: Environment::Production,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("database_password", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

impl ServerConfig {
    /// Load `path` into the process environment without overriding
    /// variables that are already set
    pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
        dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => defaults.port,
        };

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            database: lookup("DATABASE").unwrap_or(defaults.database),
            database_password: lookup("DATABASE_PASSWORD").unwrap_or_default(),
            environment: lookup("APP_ENV")
                .map(|flag| Environment::from_flag(&flag))
                .unwrap_or(defaults.environment),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.database.starts_with(MEMORY_SCHEME) {
            let scheme = self
                .database
                .split_once("://")
                .map(|(scheme, _)| scheme)
                .unwrap_or(self.database.as_str());
            return Err(ConfigError::UnsupportedDatabase(scheme.to_string()));
        }
        if self.database.contains(PASSWORD_PLACEHOLDER) && self.database_password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        Ok(())
    }

    /// Connection string with the password substituted
    pub fn connection_string(&self) -> String {
        self.database
            .replace(PASSWORD_PLACEHOLDER, &self.database_password)
    }

    /// Database name of `memory://[user:password@]name`
    pub fn database_name(&self) -> Result<String, ConfigError> {
        let connection = self.connection_string();
        let target = connection
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| ConfigError::UnsupportedDatabase(connection.clone()))?;
        let name = target.rsplit_once('@').map_or(target, |(_, name)| name);

        if name.is_empty() {
            return Err(ConfigError::MissingDatabaseName);
        }
        Ok(name.to_string())
    }

    /// Open the store named by the connection string
    pub fn open_store(&self) -> Result<Arc<dyn DocumentStore>, ConfigError> {
        self.validate()?;
        let name = self.database_name()?;
        info!(database = %name, "DB connection successful!");
        Ok(Arc::new(MemoryStore::with_tours()))
    }

    /// Whether per-request logging is enabled
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// `host:port`, resolved when binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
