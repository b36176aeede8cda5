//! Database connection management using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{ChatError, Result};

/// Initialize the database connection pool
pub async fn init_pool(config: &AppConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(&config.database_url)
        .await
        .map_err(|e| ChatError::Database(format!("Failed to connect: {}", e)))?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| ChatError::Database(format!("Connection test failed: {}", e)))?;

    Ok(pool)
}
