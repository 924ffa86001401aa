//! gaia-care - care monitoring service
//!
//! Startup sequence: tracing, build identification, configuration, root
//! folder, database, settings, HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use gaia_common::config::{self, ROOT_FOLDER_ENV};
use gaia_common::db::{init_database, CareSettings};
use gaia_care::{build_router, AppState};
use std::path::PathBuf;
use tracing::{error, info};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5740;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "gaia-care", version, about = "GaIA care monitoring service")]
struct Args {
    /// Root folder holding the database
    #[arg(long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing so it can supply the log level
    let toml_config = config::load_toml_config()?;

    let default_level = toml_config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!(
        "Starting GaIA care service (gaia-care) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready: {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let settings = CareSettings::load(&pool).await?;
    info!(
        "Settings: request timeout {}ms, auto alerts {}",
        settings.http_request_timeout_ms,
        if settings.auto_alerts_enabled { "on" } else { "off" }
    );

    let app = build_router(AppState::new(pool, settings));

    let bind = args
        .bind
        .or(toml_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("gaia-care listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
