//! Permission repository.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewPermission, Permission, UpdatePermission};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err};

const SEARCH_COLUMNS: &[&str] =
    &["permissions.name", "permissions.slug", "permissions.group_name"];
const SORT_COLUMNS: &[&str] =
    &["name", "slug", "group_name", "status", "created_at", "updated_at"];

/// Permissions are browsed by group in the admin UI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionFilter {
    pub group_name: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
struct PermissionRow {
    id: i64,
    name: String,
    slug: String,
    group_name: Option<String>,
    description: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_permission(row: PermissionRow) -> Permission {
    Permission {
        id: row.id,
        name: row.name,
        slug: row.slug,
        group_name: row.group_name,
        description: row.description,
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
pub struct PermissionRepository {
    pool: DbPool,
}

impl PermissionRepository {
    pub const TABLE: LifecycleTable =
        LifecycleTable { table: "permissions", display: "Permission" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(permission_name = %input.name), name = "db_create_permission")]
    pub async fn create(&self, input: NewPermission, actor: Option<&Actor>) -> Result<Permission> {
        let slug = unique_slug(&self.pool, "permissions", &input.name, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO permissions (name, slug, group_name, description, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.group_name)
        .bind(&input.description)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Permission", "Failed to create permission"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Permission not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_permission")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Permission>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT permissions.* FROM permissions");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("permissions.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "permissions", trash);

        let row = qb
            .build_query_as::<PermissionRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch permission"))?;

        Ok(row.map(row_to_permission))
    }

    #[instrument(skip(self, update, actor), name = "db_update_permission")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdatePermission,
        actor: Option<&Actor>,
    ) -> Result<Permission> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Permission", id))?;

        let slug = match &update.name {
            Some(name) if *name != current.name => {
                unique_slug(&self.pool, "permissions", name, Some(id)).await?
            }
            _ => current.slug,
        };
        let name = update.name.unwrap_or(current.name);
        let group_name = update.group_name.or(current.group_name);
        let description = update.description.or(current.description);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE permissions
            SET name = ?, slug = ?, group_name = ?, description = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(&group_name)
        .bind(&description)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Permission", "Failed to update permission"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Permission not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &PermissionFilter,
    ) {
        query::push_trash_filter(qb, w, "permissions", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "permissions.group_name", filter.group_name.clone());
        query::push_eq(qb, w, "permissions.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_permissions")]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: &PermissionFilter,
    ) -> Result<Page<Permission>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM permissions");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count permissions"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT permissions.* FROM permissions");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "permissions",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<PermissionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list permissions"))?;

        Ok(Page::new(rows.into_iter().map(row_to_permission).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_permission")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Permission> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Permission", id))?;

        let name = ensure_unique(
            &self.pool,
            "permissions",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[],
        )
        .await?;

        self.create(
            NewPermission {
                name,
                group_name: source.group_name,
                description: source.description,
                status: Some(false),
            },
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
    async fn test_group_filtering() {
        let repo = PermissionRepository::new(test_pool().await);
        for (name, group) in [
            ("manage-news", "content"),
            ("manage-pages", "content"),
            ("manage-roles", "access"),
        ] {
            repo.create(
                NewPermission {
                    name: name.to_string(),
                    group_name: Some(group.to_string()),
                    description: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        }

        let filter = PermissionFilter { group_name: Some("content".to_string()), status: None };
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 2);
    }
}
