//! Static page repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewPage, Page as PageEntity, UpdatePage};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["pages.title", "pages.slug", "pages.meta_title"];
const SORT_COLUMNS: &[&str] = &["title", "slug", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct PageRow {
    id: i64,
    title: String,
    slug: String,
    body: Option<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_page(row: PageRow) -> PageEntity {
    PageEntity {
        id: row.id,
        title: row.title,
        slug: row.slug,
        body: row.body,
        meta_title: row.meta_title,
        meta_description: row.meta_description,
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
pub struct PageRepository {
    pool: DbPool,
}

impl PageRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "pages", display: "Page" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(page_title = %input.title), name = "db_create_page")]
    pub async fn create(&self, input: NewPage, actor: Option<&Actor>) -> Result<PageEntity> {
        let slug = unique_slug(&self.pool, "pages", &input.title, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO pages (title, slug, body, meta_title, meta_description, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.body)
        .bind(&input.meta_title)
        .bind(&input.meta_description)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Page", "Failed to create page"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Page not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_page")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<PageEntity>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT pages.* FROM pages");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("pages.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "pages", trash);

        let row = qb
            .build_query_as::<PageRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch page"))?;

        Ok(row.map(row_to_page))
    }

    #[instrument(skip(self), name = "db_get_page_by_slug")]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<PageEntity>> {
        let row = sqlx::query_as::<_, PageRow>(
            "SELECT pages.* FROM pages WHERE slug = ? AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch page by slug"))?;

        Ok(row.map(row_to_page))
    }

    #[instrument(skip(self, update, actor), name = "db_update_page")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdatePage,
        actor: Option<&Actor>,
    ) -> Result<PageEntity> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Page", id))?;

        let slug = match &update.title {
            Some(title) if *title != current.title => {
                unique_slug(&self.pool, "pages", title, Some(id)).await?
            }
            _ => current.slug,
        };
        let title = update.title.unwrap_or(current.title);
        let body = update.body.or(current.body);
        let meta_title = update.meta_title.or(current.meta_title);
        let meta_description = update.meta_description.or(current.meta_description);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE pages
            SET title = ?, slug = ?, body = ?, meta_title = ?, meta_description = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&slug)
        .bind(&body)
        .bind(&meta_title)
        .bind(&meta_description)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Page", "Failed to update page"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Page not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "pages", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "pages.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_pages")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<PageEntity>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM pages");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count pages"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT pages.* FROM pages");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "pages",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<PageRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list pages"))?;

        Ok(Page::new(rows.into_iter().map(row_to_page).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_page")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<PageEntity> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Page", id))?;

        self.create(
            NewPage {
                title: format!("{} (Copy)", source.title),
                body: source.body,
                meta_title: source.meta_title,
                meta_description: source.meta_description,
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
    async fn test_create_find_by_slug_and_duplicate() {
        let repo = PageRepository::new(test_pool().await);
        let page = repo
            .create(
                NewPage {
                    title: "Admissions".to_string(),
                    body: Some("How to apply".to_string()),
                    meta_title: None,
                    meta_description: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(page.slug, "admissions");

        let found = repo.find_by_slug("admissions").await.unwrap().expect("page");
        assert_eq!(found.id, page.id);

        let copy = repo.duplicate(page.id, None).await.unwrap();
        assert_eq!(copy.slug, "admissions-copy");
    }
}
