//! Timezone repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewTimezone, Timezone, UpdateTimezone};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["timezones.name", "timezones.utc_offset"];
const SORT_COLUMNS: &[&str] = &["name", "utc_offset", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct TimezoneRow {
    id: i64,
    name: String,
    utc_offset: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_timezone(row: TimezoneRow) -> Timezone {
    Timezone {
        id: row.id,
        name: row.name,
        utc_offset: row.utc_offset,
        status: row.status,
        created_by: row.created_by,
        created_by_name: row.created_by_name,
        updated_by: row.updated_by,
        updated_by_name: row.updated_by_name,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
    }
}

#[derive(Debug, Clone)]
pub struct TimezoneRepository {
    pool: DbPool,
}

impl TimezoneRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "timezones", display: "Timezone" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(timezone_name = %input.name), name = "db_create_timezone")]
    pub async fn create(&self, input: NewTimezone, actor: Option<&Actor>) -> Result<Timezone> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO timezones (name, utc_offset, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.utc_offset)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Timezone", "Failed to create timezone"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Timezone not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_timezone")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Timezone>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT timezones.* FROM timezones");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("timezones.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "timezones", trash);

        let row = qb
            .build_query_as::<TimezoneRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch timezone"))?;

        Ok(row.map(row_to_timezone))
    }

    #[instrument(skip(self, update, actor), name = "db_update_timezone")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateTimezone,
        actor: Option<&Actor>,
    ) -> Result<Timezone> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Timezone", id))?;

        let name = update.name.unwrap_or(current.name);
        let utc_offset = update.utc_offset.or(current.utc_offset);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE timezones
            SET name = ?, utc_offset = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&utc_offset)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Timezone", "Failed to update timezone"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Timezone not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "timezones", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "timezones.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_timezones")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Timezone>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM timezones");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count timezones"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT timezones.* FROM timezones");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "timezones",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<TimezoneRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list timezones"))?;

        Ok(Page::new(rows.into_iter().map(row_to_timezone).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_timezone")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Timezone> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Timezone", id))?;

        let name = ensure_unique(
            &self.pool,
            "timezones",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[],
        )
        .await?;

        self.create(
            NewTimezone { name, utc_offset: source.utc_offset, status: Some(false) },
            actor,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    #[tokio::test]
    async fn test_name_unique() {
        let repo = TimezoneRepository::new(test_pool().await);
        let new = || NewTimezone {
            name: "Europe/Berlin".to_string(),
            utc_offset: Some("+01:00".to_string()),
            status: None,
        };

        repo.create(new(), None).await.unwrap();
        assert!(matches!(repo.create(new(), None).await.unwrap_err(), Error::Conflict { .. }));
    }
}
