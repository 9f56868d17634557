//! Gallery repository.
//!
//! Force-deleting a gallery item is the one lifecycle exit that owns a blob:
//! the API layer deletes the stored image after the row is gone.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, GalleryItem, NewGalleryItem, UpdateGalleryItem};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["gallery_items.title", "gallery_items.caption"];
const SORT_COLUMNS: &[&str] = &["title", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct GalleryRow {
    id: i64,
    title: String,
    image: Option<String>,
    caption: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_item(row: GalleryRow) -> GalleryItem {
    GalleryItem {
        id: row.id,
        title: row.title,
        image: row.image,
        caption: row.caption,
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
pub struct GalleryRepository {
    pool: DbPool,
}

impl GalleryRepository {
    pub const TABLE: LifecycleTable =
        LifecycleTable { table: "gallery_items", display: "Gallery item" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(item_title = %input.title), name = "db_create_gallery_item")]
    pub async fn create(&self, input: NewGalleryItem, actor: Option<&Actor>) -> Result<GalleryItem> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO gallery_items (title, image, caption, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.image)
        .bind(&input.caption)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Gallery item", "Failed to create gallery item"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Gallery item not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_gallery_item")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<GalleryItem>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT gallery_items.* FROM gallery_items");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("gallery_items.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "gallery_items", trash);

        let row = qb
            .build_query_as::<GalleryRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch gallery item"))?;

        Ok(row.map(row_to_item))
    }

    #[instrument(skip(self, update, actor), name = "db_update_gallery_item")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateGalleryItem,
        actor: Option<&Actor>,
    ) -> Result<GalleryItem> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Gallery item", id))?;

        let title = update.title.unwrap_or(current.title);
        let image = update.image.or(current.image);
        let caption = update.caption.or(current.caption);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE gallery_items
            SET title = ?, image = ?, caption = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&image)
        .bind(&caption)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Gallery item", "Failed to update gallery item"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Gallery item not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "gallery_items", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "gallery_items.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_gallery_items")]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: &StatusFilter,
    ) -> Result<Page<GalleryItem>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM gallery_items");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count gallery items"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT gallery_items.* FROM gallery_items");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "gallery_items",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<GalleryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list gallery items"))?;

        Ok(Page::new(rows.into_iter().map(row_to_item).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_gallery_item")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<GalleryItem> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Gallery item", id))?;

        self.create(
            NewGalleryItem {
                title: format!("{} (Copy)", source.title),
                image: source.image,
                caption: source.caption,
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
    async fn test_create_and_list() {
        let repo = GalleryRepository::new(test_pool().await);
        repo.create(
            NewGalleryItem {
                title: "Campus in spring".to_string(),
                image: Some("gallery/spring.jpg".to_string()),
                caption: None,
                status: None,
            },
            None,
        )
        .await
        .unwrap();

        let page = repo.list(&ListParams::default(), &StatusFilter::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].image.as_deref(), Some("gallery/spring.jpg"));
    }
}
