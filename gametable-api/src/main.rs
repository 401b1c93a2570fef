use anyhow::{Context, Result};
use clap::Parser;
use gametable_core::config::Config;
use gametable_core::core_session::{InMemoryCharacterDirectory, SessionService};
use gametable_core::http::ApiServer;
use gametable_core::logging::init_logging_with_config;
use gametable_core::metrics::init_metrics;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gametable-api")]
#[command(author, version, about = "HTTP API for game sessions and invites", long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults plus GAMETABLE_* variables otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configured one
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Character directory (JSON array of {id, owner, name})
    #[arg(long)]
    characters: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env()?,
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_logging_with_config(config.logging.clone())?;
    init_metrics();

    if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let characters = match &args.characters {
        Some(path) => InMemoryCharacterDirectory::from_json_file(path)?,
        None => InMemoryCharacterDirectory::new(),
    };
    info!(
        store = %config.store.path.display(),
        characters = characters.len(),
        policy = ?config.policy,
        "starting Gametable API"
    );

    let service = SessionService::from_config(&config, Arc::new(characters))?;

    ApiServer::new(service, config.server.bind_address)
        .with_shutdown_timeout(config.server.shutdown_timeout)
        .run()
        .await
}
