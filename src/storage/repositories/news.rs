//! News article repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewNews, News, UpdateNews};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["news.title", "news.slug", "news.excerpt"];
const SORT_COLUMNS: &[&str] =
    &["title", "slug", "published_at", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    slug: String,
    excerpt: Option<String>,
    body: Option<String>,
    image: Option<String>,
    published_at: Option<DateTime<Utc>>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_news(row: NewsRow) -> News {
    News {
        id: row.id,
        title: row.title,
        slug: row.slug,
        excerpt: row.excerpt,
        body: row.body,
        image: row.image,
        published_at: row.published_at,
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
pub struct NewsRepository {
    pool: DbPool,
}

impl NewsRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "news", display: "News" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(news_title = %input.title), name = "db_create_news")]
    pub async fn create(&self, input: NewNews, actor: Option<&Actor>) -> Result<News> {
        let slug = unique_slug(&self.pool, "news", &input.title, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO news (title, slug, excerpt, body, image, published_at, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.excerpt)
        .bind(&input.body)
        .bind(&input.image)
        .bind(input.published_at)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "News", "Failed to create news article"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("News article not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_news")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<News>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT news.* FROM news");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("news.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "news", trash);

        let row = qb
            .build_query_as::<NewsRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch news article"))?;

        Ok(row.map(row_to_news))
    }

    /// Lookup by slug, used by the public site.
    #[instrument(skip(self), name = "db_get_news_by_slug")]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<News>> {
        let row = sqlx::query_as::<_, NewsRow>(
            "SELECT news.* FROM news WHERE slug = ? AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch news article by slug"))?;

        Ok(row.map(row_to_news))
    }

    #[instrument(skip(self, update, actor), name = "db_update_news")]
    pub async fn update(&self, id: i64, update: UpdateNews, actor: Option<&Actor>) -> Result<News> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("News", id))?;

        let slug = match &update.title {
            Some(title) if *title != current.title => {
                unique_slug(&self.pool, "news", title, Some(id)).await?
            }
            _ => current.slug,
        };
        let title = update.title.unwrap_or(current.title);
        let excerpt = update.excerpt.or(current.excerpt);
        let body = update.body.or(current.body);
        let image = update.image.or(current.image);
        let published_at = update.published_at.or(current.published_at);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE news
            SET title = ?, slug = ?, excerpt = ?, body = ?, image = ?, published_at = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&slug)
        .bind(&excerpt)
        .bind(&body)
        .bind(&image)
        .bind(published_at)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "News", "Failed to update news article"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("News article not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "news", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "news.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_news")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<News>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM news");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count news articles"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT news.* FROM news");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "news",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<NewsRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list news articles"))?;

        Ok(Page::new(rows.into_iter().map(row_to_news).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_news")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<News> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("News", id))?;

        self.create(
            NewNews {
                title: format!("{} (Copy)", source.title),
                excerpt: source.excerpt,
                body: source.body,
                image: source.image,
                published_at: None,
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

    fn article(title: &str) -> NewNews {
        NewNews {
            title: title.to_string(),
            excerpt: Some("Convocation details".to_string()),
            body: Some("Full text".to_string()),
            image: None,
            published_at: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_slug_collisions_get_suffixes() {
        let repo = NewsRepository::new(test_pool().await);
        let a = repo.create(article("Spring Convocation"), None).await.unwrap();
        let b = repo.create(article("Spring  Convocation!"), None).await.unwrap();

        assert_eq!(a.slug, "spring-convocation");
        assert_eq!(b.slug, "spring-convocation-1");
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let repo = NewsRepository::new(test_pool().await);
        let created = repo.create(article("Open Day"), None).await.unwrap();

        let found = repo.find_by_slug("open-day").await.unwrap().expect("article");
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_resets_publication() {
        let repo = NewsRepository::new(test_pool().await);
        let mut input = article("Graduation");
        input.published_at = Some(Utc::now());
        let source = repo.create(input, None).await.unwrap();

        let copy = repo.duplicate(source.id, None).await.unwrap();
        assert_eq!(copy.title, "Graduation (Copy)");
        assert_eq!(copy.slug, "graduation-copy");
        assert!(copy.published_at.is_none());
        assert!(!copy.status);
    }
}
