//! Homepage slider repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewSlider, Slider, UpdateSlider};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["sliders.title", "sliders.subtitle"];
const SORT_COLUMNS: &[&str] = &["title", "sort_order", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct SliderRow {
    id: i64,
    title: String,
    subtitle: Option<String>,
    image: Option<String>,
    link: Option<String>,
    sort_order: i64,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_slider(row: SliderRow) -> Slider {
    Slider {
        id: row.id,
        title: row.title,
        subtitle: row.subtitle,
        image: row.image,
        link: row.link,
        sort_order: row.sort_order,
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
pub struct SliderRepository {
    pool: DbPool,
}

impl SliderRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "sliders", display: "Slider" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(slider_title = %input.title), name = "db_create_slider")]
    pub async fn create(&self, input: NewSlider, actor: Option<&Actor>) -> Result<Slider> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO sliders (title, subtitle, image, link, sort_order, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image)
        .bind(&input.link)
        .bind(input.sort_order.unwrap_or(0))
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Slider", "Failed to create slider"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Slider not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_slider")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Slider>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT sliders.* FROM sliders");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("sliders.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "sliders", trash);

        let row = qb
            .build_query_as::<SliderRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch slider"))?;

        Ok(row.map(row_to_slider))
    }

    #[instrument(skip(self, update, actor), name = "db_update_slider")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateSlider,
        actor: Option<&Actor>,
    ) -> Result<Slider> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Slider", id))?;

        let title = update.title.unwrap_or(current.title);
        let subtitle = update.subtitle.or(current.subtitle);
        let image = update.image.or(current.image);
        let link = update.link.or(current.link);
        let sort_order = update.sort_order.unwrap_or(current.sort_order);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE sliders
            SET title = ?, subtitle = ?, image = ?, link = ?, sort_order = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&subtitle)
        .bind(&image)
        .bind(&link)
        .bind(sort_order)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Slider", "Failed to update slider"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Slider not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "sliders", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "sliders.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_sliders")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Slider>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sliders");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count sliders"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT sliders.* FROM sliders");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "sliders",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<SliderRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list sliders"))?;

        Ok(Page::new(rows.into_iter().map(row_to_slider).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_slider")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Slider> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Slider", id))?;

        self.create(
            NewSlider {
                title: format!("{} (Copy)", source.title),
                subtitle: source.subtitle,
                image: source.image,
                link: source.link,
                sort_order: Some(source.sort_order),
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
    async fn test_sort_order_defaults_and_ordering() {
        let repo = SliderRepository::new(test_pool().await);
        for (title, order) in [("Second", 2), ("First", 1)] {
            repo.create(
                NewSlider {
                    title: title.to_string(),
                    subtitle: None,
                    image: None,
                    link: None,
                    sort_order: Some(order),
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        }

        let params = ListParams {
            sort_by: Some("sort_order".to_string()),
            sort_direction: crate::storage::SortDirection::Asc,
            ..Default::default()
        };
        let page = repo.list(&params, &StatusFilter::default()).await.unwrap();
        assert_eq!(page.items[0].title, "First");
    }
}
