//! # Shared Soft-Delete Lifecycle Operations
//!
//! Every entity type shares the same trash semantics: soft delete via
//! `deleted_at`, restore, force delete (only from trash), bulk variants,
//! trash emptying, status toggling, and time-window statistics. The SQL for
//! those operations is identical across tables, so it lives here once, keyed
//! by a [`LifecycleTable`] descriptor. Typed per-entity queries (create,
//! find, update, list) stay in the individual repositories.
//!
//! All mutating operations run inside a transaction. Bulk loops deliberately
//! do not catch per-row errors: a mid-loop failure aborts the whole batch.

use chrono::{DateTime, Datelike, Utc};
use sqlx::{QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, LifecycleStatistics};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

/// Static description of one lifecycle-managed table.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleTable {
    /// SQL table name.
    pub table: &'static str,
    /// Human-readable singular name used in error messages.
    pub display: &'static str,
}

fn ids_repr(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push(" (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    qb.push(")");
}

/// Append `updated_by`/`updated_by_name` set clauses when an actor is
/// present. Anonymous callers leave the previous stamp untouched.
pub fn push_updated_by(qb: &mut QueryBuilder<'_, Sqlite>, actor: Option<&Actor>) {
    if let Some(actor) = actor {
        qb.push(", updated_by = ")
            .push_bind(actor.id)
            .push(", updated_by_name = ")
            .push_bind(actor.name.clone());
    }
}

/// Soft-delete one active row. NotFound if the id does not resolve to an
/// active row.
#[instrument(skip(pool), fields(table = t.table, id = id))]
pub async fn soft_delete(pool: &DbPool, t: &LifecycleTable, id: i64) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin soft-delete transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table).push(" SET deleted_at = ").push_bind(Utc::now());
    qb.push(" WHERE id = ").push_bind(id).push(" AND deleted_at IS NULL");

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to soft-delete {}", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, id));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit soft-delete"))?;
    Ok(())
}

/// Restore one trashed row, stamping the restoring actor. NotFound if no
/// trashed row with that id exists.
#[instrument(skip(pool, actor), fields(table = t.table, id = id))]
pub async fn restore(pool: &DbPool, t: &LifecycleTable, id: i64, actor: Option<&Actor>) -> Result<()> {
    let mut tx =
        pool.begin().await.map_err(|e| Error::database(e, "Failed to begin restore transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table).push(" SET deleted_at = NULL, updated_at = ").push_bind(Utc::now());
    push_updated_by(&mut qb, actor);
    qb.push(" WHERE id = ").push_bind(id).push(" AND deleted_at IS NOT NULL");

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to restore {}", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, id));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit restore"))?;
    Ok(())
}

/// Permanently delete one row, only if it is already trashed. Deleting an
/// active row is a NotFound: callers must soft-delete first (two-step
/// deletion invariant).
#[instrument(skip(pool), fields(table = t.table, id = id))]
pub async fn force_delete(pool: &DbPool, t: &LifecycleTable, id: i64) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin force-delete transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM ");
    qb.push(t.table).push(" WHERE id = ").push_bind(id).push(" AND deleted_at IS NOT NULL");

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to force-delete {}", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, id));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit force-delete"))?;
    Ok(())
}

/// Soft-delete every matching active row. NotFound when none of the ids
/// resolve; a partial match succeeds with the actual affected count.
#[instrument(skip(pool), fields(table = t.table, ids = %ids_repr(ids)))]
pub async fn bulk_soft_delete(pool: &DbPool, t: &LifecycleTable, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Err(Error::not_found(t.display, "[]"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin bulk-delete transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table).push(" SET deleted_at = ").push_bind(Utc::now());
    qb.push(" WHERE deleted_at IS NULL AND id IN");
    push_id_list(&mut qb, ids);

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to bulk soft-delete {}", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, ids_repr(ids)));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit bulk-delete"))?;
    Ok(affected)
}

/// Restore every matching trashed row, stamping the actor. NotFound when
/// none of the ids are currently trashed.
#[instrument(skip(pool, actor), fields(table = t.table, ids = %ids_repr(ids)))]
pub async fn bulk_restore(
    pool: &DbPool,
    t: &LifecycleTable,
    ids: &[i64],
    actor: Option<&Actor>,
) -> Result<u64> {
    if ids.is_empty() {
        return Err(Error::not_found(t.display, "[]"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin bulk-restore transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table).push(" SET deleted_at = NULL, updated_at = ").push_bind(Utc::now());
    push_updated_by(&mut qb, actor);
    qb.push(" WHERE deleted_at IS NOT NULL AND id IN");
    push_id_list(&mut qb, ids);

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to bulk-restore {}", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, ids_repr(ids)));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit bulk-restore"))?;
    Ok(affected)
}

/// Permanently delete every matching trashed row, one row at a time inside a
/// single transaction. Per-row deletion is the contract (deletions may have
/// side effects tracked by callers); an error on any row aborts the batch.
#[instrument(skip(pool), fields(table = t.table, ids = %ids_repr(ids)))]
pub async fn bulk_force_delete(pool: &DbPool, t: &LifecycleTable, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Err(Error::not_found(t.display, "[]"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin bulk-force-delete transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM ");
    qb.push(t.table).push(" WHERE deleted_at IS NOT NULL AND id IN");
    push_id_list(&mut qb, ids);

    let trashed: Vec<i64> = qb
        .build_query_scalar()
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to resolve trashed {}", t.display)))?;

    if trashed.is_empty() {
        return Err(Error::not_found(t.display, ids_repr(ids)));
    }

    let mut count = 0u64;
    for id in trashed {
        let mut del = QueryBuilder::<Sqlite>::new("DELETE FROM ");
        del.push(t.table).push(" WHERE id = ").push_bind(id);
        del.build()
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::database(e, format!("Failed to force-delete {}", t.display)))?;
        count += 1;
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit bulk-force-delete"))?;
    Ok(count)
}

/// Force-delete every currently trashed row. An already-empty trash returns
/// 0, not an error.
#[instrument(skip(pool), fields(table = t.table))]
pub async fn empty_trash(pool: &DbPool, t: &LifecycleTable) -> Result<u64> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin empty-trash transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM ");
    qb.push(t.table).push(" WHERE deleted_at IS NOT NULL");

    let trashed: Vec<i64> = qb
        .build_query_scalar()
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to list trashed {}", t.display)))?;

    let mut count = 0u64;
    for id in trashed {
        let mut del = QueryBuilder::<Sqlite>::new("DELETE FROM ");
        del.push(t.table).push(" WHERE id = ").push_bind(id);
        del.build()
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::database(e, format!("Failed to empty {} trash", t.display)))?;
        count += 1;
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit empty-trash"))?;
    Ok(count)
}

/// Flip the boolean `status` of one active row, stamping the actor.
#[instrument(skip(pool, actor), fields(table = t.table, id = id))]
pub async fn toggle_status(
    pool: &DbPool,
    t: &LifecycleTable,
    id: i64,
    actor: Option<&Actor>,
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin toggle-status transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table).push(" SET status = NOT status, updated_at = ").push_bind(Utc::now());
    push_updated_by(&mut qb, actor);
    qb.push(" WHERE id = ").push_bind(id).push(" AND deleted_at IS NULL");

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to toggle {} status", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, id));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit toggle-status"))?;
    Ok(())
}

/// Set `status` on every matching active row in one write, stamping
/// `updated_by`/`updated_at` uniformly. NotFound when zero rows match.
#[instrument(skip(pool, actor), fields(table = t.table, ids = %ids_repr(ids), status = status))]
pub async fn bulk_update_status(
    pool: &DbPool,
    t: &LifecycleTable,
    ids: &[i64],
    status: bool,
    actor: Option<&Actor>,
) -> Result<u64> {
    if ids.is_empty() {
        return Err(Error::not_found(t.display, "[]"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::database(e, "Failed to begin bulk-status transaction"))?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
    qb.push(t.table)
        .push(" SET status = ")
        .push_bind(status)
        .push(", updated_at = ")
        .push_bind(Utc::now());
    push_updated_by(&mut qb, actor);
    qb.push(" WHERE deleted_at IS NULL AND id IN");
    push_id_list(&mut qb, ids);

    let affected = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::database(e, format!("Failed to bulk-update {} status", t.display)))?
        .rows_affected();

    if affected == 0 {
        return Err(Error::not_found(t.display, ids_repr(ids)));
    }

    tx.commit().await.map_err(|e| Error::database(e, "Failed to commit bulk-status"))?;
    Ok(affected)
}

/// Count aggregations over the table's full history, with time windows
/// relative to the call time: calendar day, ISO week (Monday start), and
/// calendar month, all in UTC.
#[instrument(skip(pool), fields(table = t.table))]
pub async fn statistics(pool: &DbPool, t: &LifecycleTable) -> Result<LifecycleStatistics> {
    let now = Utc::now();
    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::internal("Failed to compute start of day"))?;
    let week_start = today
        - chrono::Duration::days(i64::from(now.date_naive().weekday().num_days_from_monday()));
    let month_start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::internal("Failed to compute start of month"))?;

    let total = count_where(pool, t, "1 = 1", None).await?;
    let trashed = count_where(pool, t, "deleted_at IS NOT NULL", None).await?;
    let active = count_where(pool, t, "deleted_at IS NULL AND status = 1", None).await?;
    let this_month = count_where(pool, t, "created_at >= ", Some(month_start)).await?;
    let this_week = count_where(pool, t, "created_at >= ", Some(week_start)).await?;
    let today = count_where(pool, t, "created_at >= ", Some(today)).await?;

    Ok(LifecycleStatistics { total, active, trashed, this_month, this_week, today })
}

async fn count_where(
    pool: &DbPool,
    t: &LifecycleTable,
    predicate: &str,
    since: Option<DateTime<Utc>>,
) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
    qb.push(t.table).push(" WHERE ").push(predicate);
    if let Some(since) = since {
        qb.push_bind(since);
    }

    qb.build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(|e| Error::database(e, format!("Failed to count {}", t.display)))
}

/// Produce a collision-free slug for `table` derived from `text`.
///
/// The base slug is probed against existing rows (trashed included, since
/// the unique index covers them) and suffixed `-1`, `-2`, … until free.
/// `exclude_id` lets updates keep their own unchanged slug.
#[instrument(skip(pool))]
pub async fn unique_slug(
    pool: &DbPool,
    table: &'static str,
    text: &str,
    exclude_id: Option<i64>,
) -> Result<String> {
    let base = crate::utils::slugify(text);
    let mut candidate = base.clone();
    let mut suffix = 0u64;

    loop {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        qb.push(table).push(" WHERE slug = ").push_bind(candidate.clone());
        if let Some(id) = exclude_id {
            qb.push(" AND id != ").push_bind(id);
        }

        let taken: i64 = qb
            .build_query_scalar()
            .fetch_one(pool)
            .await
            .map_err(|e| Error::database(e, format!("Failed to probe slug on {}", table)))?;

        if taken == 0 {
            return Ok(candidate);
        }

        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    const ROLES: LifecycleTable = LifecycleTable { table: "roles", display: "Role" };

    async fn seed_role(pool: &DbPool, name: &str) -> i64 {
        let slug = unique_slug(pool, "roles", name, None).await.unwrap();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO roles (name, slug, status, created_at, updated_at) VALUES (?, ?, 1, ?, ?)",
        )
        .bind(name)
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn deleted_at(pool: &DbPool, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT deleted_at FROM roles WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_soft_delete_restore_cycle() {
        let pool = test_pool().await;
        let id = seed_role(&pool, "Editor").await;

        soft_delete(&pool, &ROLES, id).await.unwrap();
        assert!(deleted_at(&pool, id).await.is_some());

        // Already trashed: second soft delete is a NotFound.
        assert!(matches!(
            soft_delete(&pool, &ROLES, id).await,
            Err(Error::NotFound { .. })
        ));

        let actor = Actor::new(7, "Dean Admin");
        restore(&pool, &ROLES, id, Some(&actor)).await.unwrap();
        assert!(deleted_at(&pool, id).await.is_none());

        let updated_by: Option<i64> =
            sqlx::query_scalar("SELECT updated_by FROM roles WHERE id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(updated_by, Some(7));
    }

    #[tokio::test]
    async fn test_force_delete_requires_trash() {
        let pool = test_pool().await;
        let id = seed_role(&pool, "Registrar").await;

        // Active row: force delete refused.
        assert!(matches!(
            force_delete(&pool, &ROLES, id).await,
            Err(Error::NotFound { .. })
        ));

        soft_delete(&pool, &ROLES, id).await.unwrap();
        force_delete(&pool, &ROLES, id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_bulk_delete_partial_match_counts_only_affected() {
        let pool = test_pool().await;
        let a = seed_role(&pool, "A").await;
        let b = seed_role(&pool, "B").await;

        let affected = bulk_soft_delete(&pool, &ROLES, &[a, b, 9999]).await.unwrap();
        assert_eq!(affected, 2);

        // Nothing left to delete.
        assert!(bulk_soft_delete(&pool, &ROLES, &[a, b]).await.is_err());
        assert!(bulk_soft_delete(&pool, &ROLES, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_restore_and_force_delete() {
        let pool = test_pool().await;
        let a = seed_role(&pool, "A").await;
        let b = seed_role(&pool, "B").await;
        bulk_soft_delete(&pool, &ROLES, &[a, b]).await.unwrap();

        let restored = bulk_restore(&pool, &ROLES, &[a], None).await.unwrap();
        assert_eq!(restored, 1);

        // b is still trashed, a is not; only b gets removed.
        let removed = bulk_force_delete(&pool, &ROLES, &[a, b]).await.unwrap();
        assert_eq!(removed, 1);
        assert!(deleted_at(&pool, a).await.is_none());

        assert!(bulk_force_delete(&pool, &ROLES, &[a]).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_trash_on_empty_is_zero() {
        let pool = test_pool().await;
        assert_eq!(empty_trash(&pool, &ROLES).await.unwrap(), 0);

        let a = seed_role(&pool, "A").await;
        soft_delete(&pool, &ROLES, a).await.unwrap();
        assert_eq!(empty_trash(&pool, &ROLES).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_toggle_and_bulk_status() {
        let pool = test_pool().await;
        let id = seed_role(&pool, "Lecturer").await;

        toggle_status(&pool, &ROLES, id, None).await.unwrap();
        let status: bool = sqlx::query_scalar("SELECT status FROM roles WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!status);

        let affected = bulk_update_status(&pool, &ROLES, &[id], true, None).await.unwrap();
        assert_eq!(affected, 1);
        assert!(bulk_update_status(&pool, &ROLES, &[9999], true, None).await.is_err());
    }

    #[tokio::test]
    async fn test_statistics_counts() {
        let pool = test_pool().await;
        let a = seed_role(&pool, "A").await;
        let _b = seed_role(&pool, "B").await;
        soft_delete(&pool, &ROLES, a).await.unwrap();

        let stats = statistics(&pool, &ROLES).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.trashed, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.today, 2);
        assert!(stats.this_week >= stats.today);
        assert!(stats.this_month >= stats.today);
    }

    #[tokio::test]
    async fn test_unique_slug_probing() {
        let pool = test_pool().await;
        seed_role(&pool, "Admin").await; // takes "admin"
        seed_role(&pool, "Admin").await; // takes "admin-1"

        let slug = unique_slug(&pool, "roles", "Admin", None).await.unwrap();
        assert_eq!(slug, "admin-2");
    }

    #[tokio::test]
    async fn test_unique_slug_exclude_id_for_updates() {
        let pool = test_pool().await;
        let id = seed_role(&pool, "Admissions").await;

        // Updating a record to its own slug is not a collision.
        let slug = unique_slug(&pool, "roles", "Admissions", Some(id)).await.unwrap();
        assert_eq!(slug, "admissions");

        let slug = unique_slug(&pool, "roles", "Admissions", None).await.unwrap();
        assert_eq!(slug, "admissions-1");
    }

    #[tokio::test]
    async fn test_trashed_slugs_still_collide() {
        let pool = test_pool().await;
        let id = seed_role(&pool, "Provost").await;
        soft_delete(&pool, &ROLES, id).await.unwrap();

        let slug = unique_slug(&pool, "roles", "Provost", None).await.unwrap();
        assert_eq!(slug, "provost-1");
    }
}
