//! Underwriting Engine - API Server Binary
//!
//! This binary starts the HTTP API server for the underwriting decision engine.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (empty rule catalog)
//! cargo run --bin underwriting-api
//!
//! # Run with a rule catalog and environment overrides
//! API_RULE_CATALOG_PATH=rules.json API_TIMEZONE=America/New_York cargo run --bin underwriting-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_RULE_CATALOG_PATH` - JSON array of rule sets loaded at startup
//! * `API_TIMEZONE` - IANA timezone deciding the evaluation date (default: UTC)
//! * `API_FLAT_EXTRA_COMPOSITION` - max, sum or worst_only (default: max)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_underwriting::{InMemoryRuleCatalog, RuleCatalog};
use interface_api::{config::ApiConfig, create_router};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration and the rule catalog, and
/// starts the HTTP server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The rule catalog file cannot be read or parsed
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_ configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.timezone,
        flat_extra_composition = %config.flat_extra_composition,
        "Starting Underwriting Engine API Server"
    );

    let catalog = load_catalog(&config).await?;
    let loaded = catalog.all().await.len();
    let catalog: Arc<dyn RuleCatalog> = Arc::new(catalog);

    let app = create_router(catalog, loaded, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Loads the rule catalog named by the configuration, or an empty one.
async fn load_catalog(config: &ApiConfig) -> anyhow::Result<InMemoryRuleCatalog> {
    match &config.rule_catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading rule catalog");
            InMemoryRuleCatalog::from_file(path)
                .with_context(|| format!("failed to load rule catalog {}", path.display()))
        }
        None => {
            tracing::warn!("No API_RULE_CATALOG_PATH set; every reported condition will be referred");
            Ok(InMemoryRuleCatalog::new())
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
