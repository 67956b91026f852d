//! lcpm-api - Learning Content Production Manager HTTP service
//!
//! Serves the production-management REST API and the SSE event stream.
//! Bootstrap configuration (database path, port, log level) comes from a
//! TOML file with command-line and environment overrides; everything else
//! lives in the database.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lcpm_common::config::{Config, ConfigOverrides};
use lcpm_common::db::init_database;
use lcpm_common::events::EventBus;
use lcpm_api::{build_router, AppState};

/// Command-line arguments for lcpm-api
#[derive(Parser, Debug)]
#[command(name = "lcpm-api")]
#[command(about = "Learning Content Production Manager API service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "LCPM_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database file (overrides config file)
    #[arg(short, long, env = "LCPM_DATABASE")]
    database: Option<PathBuf>,

    /// Path to the TOML config file (default: platform config directory)
    #[arg(short, long, env = "LCPM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config must load before tracing init so its log level can seed the
    // filter; RUST_LOG still wins when set
    let overrides = ConfigOverrides {
        database_path: args.database,
        port: args.port,
    };
    let config =
        Config::load(args.config.as_deref(), overrides).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "lcpm_api={level},lcpm_common={level},tower_http=info",
                    level = config.log_level
                ))
            }),
        )
        .init();

    // Log build identification immediately, before database delays
    info!(
        "Starting LCPM API (lcpm-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config.source {
        lcpm_common::config::ConfigSource::File(path) => {
            info!("Configuration: {}", path.display())
        }
        lcpm_common::config::ConfigSource::Defaults => {
            info!("Configuration: built-in defaults (no config file)")
        }
    }
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let events = EventBus::new(256);
    let state = AppState::new(pool, events);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("lcpm-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
