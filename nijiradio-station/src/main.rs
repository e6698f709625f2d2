//! NijiRadio station server - main entry point
//!
//! Serves the admin API and the WebSocket push gateway for one default
//! station and any number of named stations sharing one checkpoint database.

use anyhow::{Context, Result};
use clap::Parser;
use nijiradio_common::config::TomlConfig;
use nijiradio_common::db::{init_database, init_memory_database};
use nijiradio_common::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nijiradio_station::api::{self, AppContext};
use nijiradio_station::config::{Config, DatabaseLocation, Overrides};
use nijiradio_station::playback::StationDirectory;

/// Command-line arguments for nijiradio-station
#[derive(Parser, Debug)]
#[command(name = "nijiradio-station")]
#[command(about = "Shared-listening radio station server")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NIJIRADIO_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "NIJIRADIO_BIND")]
    bind: Option<String>,

    /// Checkpoint database file
    #[arg(short, long, env = "NIJIRADIO_DATABASE")]
    database: Option<PathBuf>,

    /// Station served on the unprefixed routes
    #[arg(short, long, env = "NIJIRADIO_STATION")]
    station: Option<String>,

    /// Config file (overrides the default search locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep checkpoints in memory only (nothing survives a restart)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nijiradio_station=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting NijiRadio station v{} (git {}, {} build)",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    let toml = TomlConfig::load_or_default(args.config.as_deref());
    let config = Config::resolve(
        Overrides {
            port: args.port,
            bind: args.bind,
            database: args.database,
            station: args.station,
            in_memory: args.memory,
        },
        toml,
    )
    .context("Invalid configuration")?;

    let pool = match &config.database {
        DatabaseLocation::File(path) => {
            info!("Checkpoint database: {}", path.display());
            init_database(path)
                .await
                .context("Failed to open checkpoint database")?
        }
        DatabaseLocation::Memory => {
            info!("Checkpoint database: in memory");
            init_memory_database()
                .await
                .context("Failed to create in-memory database")?
        }
    };

    let stations = Arc::new(StationDirectory::new(pool, Arc::new(SystemClock)));
    stations
        .activate(&config.station)
        .await
        .with_context(|| format!("Failed to activate station '{}'", config.station))?;
    info!("Default station: {}", config.station);

    let addr = config.socket_addr();
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    api::serve(listener, AppContext::new(stations, config.station), shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
