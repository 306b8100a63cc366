use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config;

pub mod models;

/// Connect to Postgres using DATABASE_URL; pool sizing and timeouts come
/// from configuration.
pub async fn connect_pool() -> Result<PgPool, sqlx::Error> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| sqlx::Error::Configuration("DATABASE_URL is not set".into()))?;

    let db = &config::config().database;
    PgPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(db.idle_timeout_secs))
        .connect(&url)
        .await
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
