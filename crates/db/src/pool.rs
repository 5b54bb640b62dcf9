//! Postgres connection pool and schema.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::DbError;

/// Type alias for the shared Postgres pool.
pub type DbPool = PgPool;

/// Create a new connection pool from the given `database_url`.
///
/// Migration runs issue one statement at a time, so a small ceiling is
/// plenty; `max_connections` exists for callers that share the pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    info!("Connecting to database (max_connections={})", max_connections);
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the embedded table schema located in `./migrations` (relative to
/// the workspace root at build time).
///
/// This creates the `block_definitions` and `workflow_templates` tables; it
/// is unrelated to the block definition migrator in the engine crate.
pub async fn apply_schema(pool: &DbPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("../../migrations");
    info!("Applying database schema ({} migrations)", migrator.iter().count());
    migrator.run(pool).await?;
    Ok(())
}
