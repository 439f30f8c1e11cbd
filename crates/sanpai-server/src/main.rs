//! Sanpai API server binary.
//!
//! Wires the configuration, connection pool, and HTTP surface together
//! and serves until terminated.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `sanpai-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Validate ability reference data (prerequisite DAG)
//! 5. Serve the API

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sanpai_api::AppState;
use sanpai_core::{AbilityService, ServiceConfig};
use sanpai_db::{PostgresConfig, PostgresPool};

/// Default configuration file path, relative to the working directory.
const CONFIG_PATH: &str = "sanpai-config.yaml";

/// Application entry point for the Sanpai API server.
///
/// # Errors
///
/// Returns an error if any initialization step or the server itself
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sanpai-server starting");

    // 2. Load configuration. A missing file falls back to defaults so a
    //    bare checkout still runs against the local Docker database.
    let config_path = Path::new(CONFIG_PATH);
    let config = if config_path.exists() {
        ServiceConfig::from_file(config_path)?
    } else {
        info!(path = CONFIG_PATH, "No config file found, using defaults");
        ServiceConfig::default()
    };
    info!(
        host = config.server.host,
        port = config.server.port,
        pray_exp = config.gameplay.pray_exp,
        remote_pray_exp = config.gameplay.remote_pray_exp,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let pool = PostgresPool::connect(&PostgresConfig::new(&config.database.url)).await?;
    pool.run_migrations().await?;

    // 4. Validate ability reference data before serving traffic: a
    //    dangling prerequisite or a cycle is an operational problem.
    AbilityService::new(pool.pool())
        .validate_reference_data()
        .await?;

    // 5. Serve the API.
    let state = Arc::new(AppState::new(pool, config.gameplay.clone()));
    sanpai_api::start_server(&config.server, state).await?;

    Ok(())
}
