//! Web event repository: public-site event announcements.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewWebEvent, UpdateWebEvent, WebEvent};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["web_events.title", "web_events.slug", "web_events.venue"];
const SORT_COLUMNS: &[&str] =
    &["title", "slug", "starts_at", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct WebEventRow {
    id: i64,
    title: String,
    slug: String,
    description: Option<String>,
    venue: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    image: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_event(row: WebEventRow) -> WebEvent {
    WebEvent {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
        venue: row.venue,
        starts_at: row.starts_at,
        ends_at: row.ends_at,
        image: row.image,
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
pub struct WebEventRepository {
    pool: DbPool,
}

impl WebEventRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "web_events", display: "Event" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn check_window(
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let (Some(start), Some(end)) = (starts_at, ends_at) {
            if end < start {
                return Err(Error::validation_field(
                    "Event cannot end before it starts",
                    "ends_at",
                ));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, input, actor), fields(event_title = %input.title), name = "db_create_event")]
    pub async fn create(&self, input: NewWebEvent, actor: Option<&Actor>) -> Result<WebEvent> {
        Self::check_window(input.starts_at, input.ends_at)?;
        let slug = unique_slug(&self.pool, "web_events", &input.title, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO web_events (title, slug, description, venue, starts_at, ends_at, image, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.description)
        .bind(&input.venue)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(&input.image)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Event", "Failed to create event"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Event not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_event")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<WebEvent>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT web_events.* FROM web_events");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("web_events.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "web_events", trash);

        let row = qb
            .build_query_as::<WebEventRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch event"))?;

        Ok(row.map(row_to_event))
    }

    #[instrument(skip(self), name = "db_get_event_by_slug")]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<WebEvent>> {
        let row = sqlx::query_as::<_, WebEventRow>(
            "SELECT web_events.* FROM web_events WHERE slug = ? AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch event by slug"))?;

        Ok(row.map(row_to_event))
    }

    #[instrument(skip(self, update, actor), name = "db_update_event")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateWebEvent,
        actor: Option<&Actor>,
    ) -> Result<WebEvent> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Event", id))?;

        let slug = match &update.title {
            Some(title) if *title != current.title => {
                unique_slug(&self.pool, "web_events", title, Some(id)).await?
            }
            _ => current.slug,
        };
        let title = update.title.unwrap_or(current.title);
        let description = update.description.or(current.description);
        let venue = update.venue.or(current.venue);
        let starts_at = update.starts_at.or(current.starts_at);
        let ends_at = update.ends_at.or(current.ends_at);
        let image = update.image.or(current.image);
        let status = update.status.unwrap_or(current.status);
        Self::check_window(starts_at, ends_at)?;
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE web_events
            SET title = ?, slug = ?, description = ?, venue = ?, starts_at = ?, ends_at = ?,
                image = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&slug)
        .bind(&description)
        .bind(&venue)
        .bind(starts_at)
        .bind(ends_at)
        .bind(&image)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Event", "Failed to update event"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Event not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "web_events", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "web_events.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_events")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<WebEvent>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM web_events");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count events"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT web_events.* FROM web_events");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "web_events",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<WebEventRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list events"))?;

        Ok(Page::new(rows.into_iter().map(row_to_event).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_event")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<WebEvent> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Event", id))?;

        self.create(
            NewWebEvent {
                title: format!("{} (Copy)", source.title),
                description: source.description,
                venue: source.venue,
                starts_at: source.starts_at,
                ends_at: source.ends_at,
                image: source.image,
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
    async fn test_window_validation() {
        let repo = WebEventRepository::new(test_pool().await);
        let start = Utc::now();
        let err = repo
            .create(
                NewWebEvent {
                    title: "Open Day".to_string(),
                    description: None,
                    venue: None,
                    starts_at: Some(start),
                    ends_at: Some(start - chrono::Duration::hours(1)),
                    image: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_and_slug() {
        let repo = WebEventRepository::new(test_pool().await);
        let event = repo
            .create(
                NewWebEvent {
                    title: "Winter Fair 2026".to_string(),
                    description: None,
                    venue: Some("Main hall".to_string()),
                    starts_at: None,
                    ends_at: None,
                    image: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(event.slug, "winter-fair-2026");
    }
}
