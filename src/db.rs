use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::PoolConfig;

/// Opens the pool and proves connectivity; failure here is fatal to the process.
pub async fn connect(database_url: &str, cfg: &PoolConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .connect(database_url)
        .await
        .context("connect to database")?;
    info!(
        max = cfg.max_connections,
        min = cfg.min_connections,
        "database connection established"
    );
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(pool).await {
        warn!(error = %e, "migration failed; continuing with existing schema");
    }
}

pub async fn close(pool: PgPool) {
    pool.close().await;
    info!("database connection closed");
}
