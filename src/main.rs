use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ctf_admin_api::app::{self, AppState};
use ctf_admin_api::config::{self, AppConfig};
use ctf_admin_api::database::{DatabaseManager, GameStore, MemoryStore, PgStore};

#[derive(Parser)]
#[command(name = "ctf-admin-api")]
#[command(about = "Admin API for CTF game objects and the game level sequence")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides config)")]
    port: Option<u16>,

    #[arg(long, help = "Keep all data in memory instead of PostgreSQL")]
    memory: bool,

    #[arg(long, env = "CTF_ADMIN_CONFIG", help = "YAML config file")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut loaded = AppConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        loaded.api.port = port;
    }
    let config = config::init(loaded)?;

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting CTF admin API in {:?} mode", config.environment);
    if ctf_admin_api::is_development!() {
        tracing::debug!("Effective config: {:?}", config);
    }

    let store: Arc<dyn GameStore> = if args.memory {
        tracing::warn!("Using the in-memory store; nothing survives a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        Arc::new(PgStore::new(pool))
    };

    let state = AppState::new(store);
    state
        .admin
        .seed_market()
        .await
        .context("failed to seed market items")?;

    let app = app::router(state, config);

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CTF admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
