//! # Database Migration Management
//!
//! Schema evolution via SQL migrations embedded in the binary from the
//! `migrations/` directory, executed automatically on startup when
//! `auto_migrate` is enabled.

use crate::errors::{Error, Result};
use crate::storage::DbPool;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| Error::config(format!("Failed to run database migrations: {}", e)))?;

    tracing::info!(migrations = MIGRATOR.iter().count(), "Database migrations up to date");
    Ok(())
}

/// Latest applied migration version, if any migration has run.
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    let version = sqlx::query_scalar::<_, i64>("SELECT MAX(version) FROM _sqlx_migrations")
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::database(e, "Failed to query migration version"))?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    #[tokio::test]
    async fn test_migrations_apply_and_report_version() {
        let pool = test_pool().await;
        let version = get_migration_version(&pool).await.unwrap();
        assert!(version.is_some());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
