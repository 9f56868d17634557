//! Role repository.
//!
//! Slugs are always derived server-side from the role name, collision-free
//! across trashed rows, and regenerated when the name changes.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewRole, Role, UpdateRole};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["roles.name", "roles.slug", "roles.description"];
const SORT_COLUMNS: &[&str] = &["name", "slug", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    slug: String,
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

fn row_to_role(row: RoleRow) -> Role {
    Role {
        id: row.id,
        name: row.name,
        slug: row.slug,
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
pub struct RoleRepository {
    pool: DbPool,
}

impl RoleRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "roles", display: "Role" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(role_name = %input.name), name = "db_create_role")]
    pub async fn create(&self, input: NewRole, actor: Option<&Actor>) -> Result<Role> {
        let slug = unique_slug(&self.pool, "roles", &input.name, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO roles (name, slug, description, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&slug)
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
        .map_err(|err| map_write_err(err, "Role", "Failed to create role"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Role not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_role")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Role>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT roles.* FROM roles");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("roles.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "roles", trash);

        let row = qb
            .build_query_as::<RoleRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch role"))?;

        Ok(row.map(row_to_role))
    }

    #[instrument(skip(self, update, actor), name = "db_update_role")]
    pub async fn update(&self, id: i64, update: UpdateRole, actor: Option<&Actor>) -> Result<Role> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Role", id))?;

        let slug = match &update.name {
            Some(name) if *name != current.name => {
                unique_slug(&self.pool, "roles", name, Some(id)).await?
            }
            _ => current.slug,
        };
        let name = update.name.unwrap_or(current.name);
        let description = update.description.or(current.description);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE roles
            SET name = ?, slug = ?, description = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(&description)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Role", "Failed to update role"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Role not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "roles", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "roles.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_roles")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Role>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM roles");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count roles"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT roles.* FROM roles");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "roles",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<RoleRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list roles"))?;

        Ok(Page::new(rows.into_iter().map(row_to_role).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_role")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Role> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Role", id))?;

        let name = ensure_unique(
            &self.pool,
            "roles",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[],
        )
        .await?;

        self.create(
            NewRole { name, description: source.description, status: Some(false) },
            actor,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    fn admin() -> NewRole {
        NewRole { name: "Admin".to_string(), description: None, status: None }
    }

    #[tokio::test]
    async fn test_slug_generated_and_probed() {
        let repo = RoleRepository::new(test_pool().await);

        let first = repo.create(admin(), None).await.unwrap();
        assert_eq!(first.slug, "admin");

        // Same name is a conflict, but a trashed row still occupies its slug.
        crate::storage::lifecycle::soft_delete(&repo.pool, &RoleRepository::TABLE, first.id)
            .await
            .unwrap();
        let second = repo.create(admin(), None).await.unwrap();
        assert_eq!(second.slug, "admin-1");
    }

    #[tokio::test]
    async fn test_rename_regenerates_slug() {
        let repo = RoleRepository::new(test_pool().await);
        let role = repo.create(admin(), None).await.unwrap();

        let updated = repo
            .update(
                role.id,
                UpdateRole { name: Some("Super Admin".to_string()), ..Default::default() },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "super-admin");

        // Update without a name change keeps the slug stable.
        let updated = repo
            .update(role.id, UpdateRole { status: Some(false), ..Default::default() }, None)
            .await
            .unwrap();
        assert_eq!(updated.slug, "super-admin");
    }

    #[tokio::test]
    async fn test_duplicate_copy_gets_fresh_slug() {
        let repo = RoleRepository::new(test_pool().await);
        let role = repo.create(admin(), None).await.unwrap();

        let copy = repo.duplicate(role.id, None).await.unwrap();
        assert_eq!(copy.name, "Admin (Copy)");
        assert_eq!(copy.slug, "admin-copy");
    }
}
