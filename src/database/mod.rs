use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the connection pool from configuration. The pool is lazy: the
/// server binds and answers before the database is reachable, and the first
/// query pays the connection cost. The handle is passed to handlers through
/// AppState; nothing else holds a connection.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect_lazy(&config.url)
        .map_err(|e| DatabaseError::InvalidUrl(e.to_string()))?;

    info!("created database pool (max {} connections)", config.max_connections);
    Ok(pool)
}

/// Apply embedded SQL migrations from `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}

/// Pings the database to ensure connectivity.
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
