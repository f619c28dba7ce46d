//! URL Cache Server - serves a two-tier URL cache over HTTP
//!
//! Decoded images live in a pixel-budgeted memory cache, raw payloads in a
//! disk cache with modification-time based invalidation.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use url_cache::{api::create_router, spawn_usage_report_task, AppState, Config};

/// Main entry point for the URL cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the URL cache with the configured settings
/// 4. Start the background memory usage report task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "url_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting URL Cache Server");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Configuration loaded: cache_path={}, max_pixel_count={}, port={}, report_interval={}s",
        config.cache.cache_path.display(),
        config.cache.max_pixel_count,
        config.server_port,
        config.report_interval
    );

    let state = AppState::from_config(&config).context("failed to create URL cache")?;

    let report_handle = if config.report_interval > 0 {
        info!("Background usage report task started");
        Some(spawn_usage_report_task(
            state.cache.clone(),
            config.report_interval,
        ))
    } else {
        info!("Usage reports disabled");
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(report_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the report task and allows graceful shutdown.
async fn shutdown_signal(report_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = report_handle {
        handle.abort();
        warn!("Usage report task aborted");
    }
}
