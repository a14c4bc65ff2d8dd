//! fleetwatch service binary: mirrors the remote agent inventory into a
//! local SQLite store on a fixed interval.

use fleetwatch_remote::SessionClient;
use fleetwatch_service::{ServiceConfig, SyncEngine};
use fleetwatch_store::AgentStore;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = match ServiceConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load config from {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let store = match AgentStore::open(&config.database.path) {
        Ok(store) => store,
        Err(e) => {
            error!("failed to open store at {}: {e}", config.database.path.display());
            std::process::exit(1);
        }
    };

    let client = SessionClient::new(
        &config.remote.base_url,
        &config.remote.username,
        &config.remote.password,
    );

    let interval = Duration::from_secs(config.sync_interval_secs.max(1));
    let engine = SyncEngine::new(client, store);
    tokio::spawn(engine.run(interval));

    info!("fleetwatch running against {}", config.remote.base_url);

    // Shutdown stops scheduling new passes; an in-flight pass is
    // abandoned at process exit.
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutting down");
}
