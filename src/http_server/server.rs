//! # HTTP Server
//!
//! Binds the tours API to a TCP listener and serves it until a shutdown
//! signal arrives.

use std::io;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::config::ServerConfig;
use crate::rest_api::{app, AppState, TOURS_PATH};
use crate::store::DocumentStore;

/// HTTP server for the tours API
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over `store`
    pub fn with_config(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        let router = app(AppState::new(store), config.is_development());
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Bind the configured address; host names are resolved
    pub async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.config.socket_addr()).await
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn start(self) -> io::Result<()> {
        let listener = self.bind().await?;
        let local = listener.local_addr()?;
        info!(
            address = %local,
            environment = %self.config.environment,
            "App running on http://{}{}",
            local,
            TOURS_PATH
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Completes on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn server(config: ServerConfig) -> HttpServer {
        HttpServer::with_config(config, Arc::new(MemoryStore::with_tours()))
    }

    #[test]
    fn test_server_creation() {
        let server = server(ServerConfig::default());
        assert_eq!(server.socket_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_server_with_custom_port() {
        let config = ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(server(config).socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_bind_resolves_host_name() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let listener = server(config).bind().await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_invalid_host_rejected() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(server(config).start().await.is_err());
    }
}
