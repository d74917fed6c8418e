//! Sesame Server: application entry point.
//!
//! Loads configuration, prepares the database, and keeps expired
//! refresh tokens swept until shut down.

mod config;

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use sesame_auth::JwtIssuer;
use sesame_core::repository::RefreshTokenRepository;
use sesame_db::DbManager;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sesame=info")),
        )
        .json()
        .init();

    tracing::info!("Starting Sesame server...");

    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Fail fast on unusable signing keys.
    JwtIssuer::new(&config.auth).context("invalid JWT signing keys")?;

    let store = DbManager::open(&config.db)
        .await
        .context("failed to open the session store")?;

    let sweep = tokio::spawn(sweep_expired_tokens(
        store.refresh_tokens(),
        Duration::from_secs(config.token_sweep_interval_secs),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    sweep.abort();
    tracing::info!("Sesame server stopped.");
    Ok(())
}

/// Periodically delete refresh tokens that are past their expiry.
async fn sweep_expired_tokens<R: RefreshTokenRepository>(tokens: R, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match tokens.delete_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Swept expired refresh tokens"),
            Err(e) => tracing::warn!(error = %e, "Refresh token sweep failed"),
        }
    }
}
