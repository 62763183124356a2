pub mod api;
pub mod auth; // Auth Gate + account administration
pub mod billing; // Invoice Engine
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod home; // Dashboard
pub mod models;
pub mod reminders; // Reminder Tracker

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("State initialisation failed: {0}")]
    Core(#[from] CoreError),
    #[error("Bootstrap admin failed: {0}")]
    Bootstrap(#[from] auth::AuthError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

/// Process entry: tracing, config, store, server; runs until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(AppConfig::from_env()?))
}

async fn serve(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(?config, "Configuration loaded");

    let core = Arc::new(CoreState::from_config(&config)?);
    bootstrap_admin(&core, &config)?;

    let server = api::start_api_server(core, config.bind_addr)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.info.server_addr, "Eye clinic API listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.stop().await;
    Ok(())
}

/// Create the first admin account on an empty users table.
fn bootstrap_admin(core: &CoreState, config: &AppConfig) -> Result<(), StartupError> {
    match &config.admin_password {
        Some(password) => {
            auth::ensure_bootstrap_admin(core, password)?;
        }
        None => {
            let conn = core.lock_db()?;
            if db::count_users(&conn).map_err(CoreError::from)? == 0 {
                tracing::warn!(
                    "No user accounts exist; set {} to create an admin on next start",
                    config::ENV_ADMIN_PASSWORD
                );
            }
        }
    }
    Ok(())
}
