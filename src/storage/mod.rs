//! # Storage Layer
//!
//! SQLite-backed persistence: connection pool, embedded migrations, shared
//! query building, the generic soft-delete lifecycle operations, and the
//! typed per-entity repositories.

pub mod lifecycle;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

pub use lifecycle::{unique_slug, LifecycleTable};
pub use migrations::{get_migration_version, run_migrations};
pub use pool::{check_connection, create_pool, DbPool};
pub use query::{ListParams, Page, SortDirection, TrashFilter};

/// In-memory pool with the full schema applied. A single connection keeps
/// every query on the same in-memory database.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite://:memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    run_migrations(&pool).await.expect("migrations apply");
    pool
}
