// ABOUTME: Server bootstrap for Tasklane
// ABOUTME: Sets up logging, the database pool, CORS, and graceful shutdown around the API router

pub mod config;


use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tasklane_api::{create_router, AppState};
use tasklane_operations::HttpWebhookNotifier;
use tokio_util::task::TaskTracker;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{Config, ConfigError, LogFormat};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str, log_format: LogFormat) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to initialize JSON logging")?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("Failed to initialize pretty logging")?,
    }

    Ok(())
}

/// The assembled application plus the tracker owning its background imports
pub struct App {
    pub router: Router,
    pub background: TaskTracker,
}

/// Connect storage and wire the router with CORS applied
pub async fn build_app(config: &Config) -> anyhow::Result<App> {
    let pool = tasklane_storage::connect(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to open database")?;

    let notifier = HttpWebhookNotifier::new(&config.webhook_url, config.webhook_timeout)
        .context("Failed to build webhook client")?;
    let background = TaskTracker::new();

    let state = AppState::new(
        pool,
        Arc::new(notifier),
        background.clone(),
        config.import_settings(),
    );
    let router = create_router(state).layer(cors_layer(&config.cors_origins)?);

    Ok(App { router, background })
}

pub(crate) fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}

/// Serve until Ctrl+C or SIGTERM, then give in-flight imports the grace period to finish
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let App { router, background } = build_app(&config).await?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    background.close();
    if tokio::time::timeout(config.shutdown_grace, background.wait())
        .await
        .is_err()
    {
        warn!(
            pending = background.len(),
            "Shutdown grace period elapsed with imports still running"
        );
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
