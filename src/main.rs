use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reservr::config::Config;
use reservr::engine::ReservationExpiry;
use reservr::AppState;

#[derive(Parser, Debug)]
#[command(name = "reservr")]
#[command(author, version, about = "A fast, lightweight studio reservation engine", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "reservr.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reservr v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data directory exists
    reservr::utils::ensure_dir(&config.server.data_dir)?;

    // Initialize database (runs migrations and seeds the studio catalog)
    let db = reservr::db::init(&config.server.data_dir).await?;

    // Initialize Prometheus metrics recorder
    let metrics_handle = reservr::api::metrics::init_metrics();

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), db.clone()).with_metrics(metrics_handle));

    // Start the pending-reservation expiry sweep
    if config.booking.expiry_enabled {
        let expiry = ReservationExpiry::new(db.clone(), config.booking.clone());
        tokio::spawn(async move {
            expiry.run().await;
        });
    }

    // Create API router
    let app = reservr::api::create_router(state);

    // Start API server
    let api_addr = format!("{}:{}", config.server.host, config.server.api_port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;

    tracing::info!("API server listening on http://{}", api_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
