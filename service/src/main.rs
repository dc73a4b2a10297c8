use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use honor_engine::Engine;
use honor_service::config::Config;
use honor_service::dashboard::{create_router, AppState};
use honor_service::leaderboard_job::{self, PublishedLeaderboard};
use honor_service::store_file::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "honor-service", about = "Honor points engine host")]
struct Args {
    /// Path to the YAML configuration file. Missing file runs defaults.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Print the resolved configuration and exit.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.0.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.config.exists() {
        warn!(path = %args.config.display(), "config file not found, running defaults");
    }
    if args.dry_run {
        println!("{config:#?}");
        return Ok(());
    }
    if config.dashboard.auth_pass.is_none() {
        warn!("dashboard.auth_pass is not set; the authenticated surface will reject all requests");
    }

    let store = JsonFileStore::open(config.store.path.clone())
        .await
        .context("Could not open account store")?;
    let engine = Arc::new(Engine::new(store, config.engine.clone()));
    let published = Arc::new(RwLock::new(PublishedLeaderboard::default()));

    tokio::spawn(leaderboard_job::run(
        engine.clone(),
        published.clone(),
        config.leaderboard.size,
        config.leaderboard.interval_secs,
    ));

    let state = AppState::new(engine, published, &config.dashboard);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.dashboard.listen)
        .await
        .with_context(|| format!("Could not bind {}", config.dashboard.listen))?;
    info!(listen = %config.dashboard.listen, "dashboard listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Dashboard server failed")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
