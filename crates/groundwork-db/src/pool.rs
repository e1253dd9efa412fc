use std::time::Duration;

use groundwork_common::{Error, Result};
use groundwork_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Build a connection pool from config. Connects eagerly so an unreachable
/// database surfaces here instead of on the first query.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| Error::Database(format!("failed to connect to database: {e}")))?;

    info!("database connected");
    Ok(pool)
}
