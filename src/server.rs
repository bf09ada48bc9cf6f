use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use travel_search::api::create_router;
use travel_search::{AppConfig, SearchOrchestrator};

/// Log to stdout and to a daily-rotated JSON file under `log_dir`
fn init_logging(log_dir: &str) -> Result<()> {
    let log_dir = PathBuf::from(log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "travel-search.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,travel_search=debug"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .init();

    debug!(log_dir = %log_dir.display(), "Logging initialized");
    Ok(())
}

/// Cancel `token` once `signal` fires. A signal that cannot be listened for
/// never resolves, so the server keeps serving.
async fn shutdown_signal<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, cancelling in-flight searches");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_logging(&config.server.log_dir)?;

    let shutdown = CancellationToken::new();
    let orchestrator = SearchOrchestrator::from_config(&config)?.with_shutdown(shutdown.clone());
    if !orchestrator.provider_configured() && config.server.fallback_without_credentials {
        warn!("Provider credential missing, all searches will return fallback results");
    }

    let app = create_router(Arc::new(orchestrator));
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        hotel_actor = %config.hotels.actor_id,
        flight_actor = %config.flights.actor_id,
        "Travel search server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c(), shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}
