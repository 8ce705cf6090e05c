use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Connect the session store's pool. A request waiting longer than
/// `acquire_timeout_secs` for a connection fails instead of queueing forever.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = pool_options(config)
        .connect(&config.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        "PostgreSQL pool ready (max {} connections)",
        config.max_connections
    );
    Ok(pool)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}
