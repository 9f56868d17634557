//! Course catalog repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, Course, NewCourse, UpdateCourse};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::{unique_slug, LifecycleTable};
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["courses.title", "courses.slug", "courses.summary"];
const SORT_COLUMNS: &[&str] = &["title", "slug", "fee", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    slug: String,
    summary: Option<String>,
    body: Option<String>,
    image: Option<String>,
    duration: Option<String>,
    fee: Option<f64>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_course(row: CourseRow) -> Course {
    Course {
        id: row.id,
        title: row.title,
        slug: row.slug,
        summary: row.summary,
        body: row.body,
        image: row.image,
        duration: row.duration,
        fee: row.fee,
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
pub struct CourseRepository {
    pool: DbPool,
}

impl CourseRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "courses", display: "Course" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(course_title = %input.title), name = "db_create_course")]
    pub async fn create(&self, input: NewCourse, actor: Option<&Actor>) -> Result<Course> {
        let slug = unique_slug(&self.pool, "courses", &input.title, None).await?;
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO courses (title, slug, summary, body, image, duration, fee, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.summary)
        .bind(&input.body)
        .bind(&input.image)
        .bind(&input.duration)
        .bind(input.fee)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Course", "Failed to create course"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Course not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_course")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Course>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT courses.* FROM courses");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("courses.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "courses", trash);

        let row = qb
            .build_query_as::<CourseRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch course"))?;

        Ok(row.map(row_to_course))
    }

    /// Lookup by slug, used by the public site.
    #[instrument(skip(self), name = "db_get_course_by_slug")]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(
            "SELECT courses.* FROM courses WHERE slug = ? AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch course by slug"))?;

        Ok(row.map(row_to_course))
    }

    #[instrument(skip(self, update, actor), name = "db_update_course")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateCourse,
        actor: Option<&Actor>,
    ) -> Result<Course> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Course", id))?;

        let slug = match &update.title {
            Some(title) if *title != current.title => {
                unique_slug(&self.pool, "courses", title, Some(id)).await?
            }
            _ => current.slug,
        };
        let title = update.title.unwrap_or(current.title);
        let summary = update.summary.or(current.summary);
        let body = update.body.or(current.body);
        let image = update.image.or(current.image);
        let duration = update.duration.or(current.duration);
        let fee = update.fee.or(current.fee);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE courses
            SET title = ?, slug = ?, summary = ?, body = ?, image = ?, duration = ?, fee = ?,
                status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&title)
        .bind(&slug)
        .bind(&summary)
        .bind(&body)
        .bind(&image)
        .bind(&duration)
        .bind(fee)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Course", "Failed to update course"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Course not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "courses", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "courses.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_courses")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Course>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM courses");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count courses"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT courses.* FROM courses");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "courses",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<CourseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list courses"))?;

        Ok(Page::new(rows.into_iter().map(row_to_course).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_course")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Course> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Course", id))?;

        self.create(
            NewCourse {
                title: format!("{} (Copy)", source.title),
                summary: source.summary,
                body: source.body,
                image: source.image,
                duration: source.duration,
                fee: source.fee,
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

    fn course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            summary: Some("Three-year undergraduate program".to_string()),
            body: Some("Full syllabus".to_string()),
            image: None,
            duration: Some("3 years".to_string()),
            fee: Some(1200.0),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_slug_and_find_by_slug() {
        let repo = CourseRepository::new(test_pool().await);
        let created = repo.create(course("Computer Science"), None).await.unwrap();

        assert_eq!(created.slug, "computer-science");
        assert_eq!(created.fee, Some(1200.0));
        let found = repo.find_by_slug("computer-science").await.unwrap().expect("course");
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_update_merges_and_regenerates_slug_on_rename() {
        let repo = CourseRepository::new(test_pool().await);
        let created = repo.create(course("Applied Physics"), None).await.unwrap();

        let updated = repo
            .update(
                created.id,
                UpdateCourse {
                    title: Some("Applied Mathematics".to_string()),
                    fee: Some(1500.0),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.slug, "applied-mathematics");
        assert_eq!(updated.fee, Some(1500.0));
        // Untouched fields survive the partial patch.
        assert_eq!(updated.duration.as_deref(), Some("3 years"));
    }

    #[tokio::test]
    async fn test_duplicate_creates_inactive_copy() {
        let repo = CourseRepository::new(test_pool().await);
        let source = repo.create(course("Economics"), None).await.unwrap();

        let copy = repo.duplicate(source.id, None).await.unwrap();
        assert_eq!(copy.title, "Economics (Copy)");
        assert_eq!(copy.slug, "economics-copy");
        assert!(!copy.status);
        assert_eq!(copy.fee, source.fee);
    }
}
