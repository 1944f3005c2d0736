//! Startup orchestration.
//!
//! Subsystems initialize in order, not concurrently; the listener binds last
//! so traffic only arrives once everything is ready.

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ProxyConfig, VarSource};
use crate::http::{AppState, HttpServer, StateError};
use crate::lifecycle::signals::spawn_signal_handler;
use crate::lifecycle::Shutdown;
use crate::observability::{init_logging, init_metrics};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("failed to build application state: {0}")]
    State(#[from] StateError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Load configuration and run the server until a termination signal.
pub async fn launch(config_path: Option<&Path>, vars: &dyn VarSource) -> Result<(), StartupError> {
    let config = load_config(config_path, vars)?;
    init_logging(&config.observability).map_err(|e| StartupError::Logging(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        items_cache_ttl_secs = config.items.cache_ttl_secs,
        orders_cache_ttl_secs = config.orders.cache_ttl_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    serve(config, shutdown).await
}

/// Build state, bind and serve; returns once `shutdown` has fired and requests have drained.
pub async fn serve(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let state = AppState::from_config(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(&config, state);
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
