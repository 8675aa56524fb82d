//! agp-tagger - bulk audio metadata correction service
//!
//! Scans a music folder, looks up genre and artist suggestions from
//! Spotify, Beatport and MusicBrainz, and applies the accepted ones back to
//! the files' tags (optionally renaming and organizing them).

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agp_common::config::{load_toml_config, resolve_config_path};
use agp_common::EventBus;
use agp_tagger::config::{resolve_settings_path, SettingsStore};
use agp_tagger::AppState;

/// Event bus capacity; slow SSE clients skip older events
const EVENT_BUS_CAPACITY: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "agp-tagger")]
#[command(about = "Bulk audio metadata correction service")]
#[command(version)]
struct Args {
    /// HTTP port (overrides the bootstrap config)
    #[arg(short, long, env = "AGP_PORT")]
    port: Option<u16>,

    /// Bootstrap config file
    #[arg(short, long, env = "AGP_CONFIG")]
    config: Option<PathBuf>,

    /// Runtime settings file
    #[arg(short, long, env = "AGP_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging starts; its level seeds the filter
    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting agp-tagger (metadata correction) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let settings_path =
        resolve_settings_path(args.settings.as_deref(), config.settings_path.as_deref())?;
    info!("Settings: {}", settings_path.display());
    let settings_store = SettingsStore::new(settings_path);

    // Fail fast on an unreadable settings file rather than on first scan
    settings_store
        .load_settings()
        .context("Failed to load runtime settings")?;

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::new(event_bus, settings_store);
    let app = agp_tagger::build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", config.bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("agp-tagger stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
