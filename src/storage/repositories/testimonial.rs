//! Testimonial repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewTestimonial, Testimonial, UpdateTestimonial};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] =
    &["testimonials.name", "testimonials.designation", "testimonials.message"];
const SORT_COLUMNS: &[&str] = &["name", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct TestimonialRow {
    id: i64,
    name: String,
    designation: Option<String>,
    message: String,
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

fn row_to_testimonial(row: TestimonialRow) -> Testimonial {
    Testimonial {
        id: row.id,
        name: row.name,
        designation: row.designation,
        message: row.message,
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
pub struct TestimonialRepository {
    pool: DbPool,
}

impl TestimonialRepository {
    pub const TABLE: LifecycleTable =
        LifecycleTable { table: "testimonials", display: "Testimonial" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), name = "db_create_testimonial")]
    pub async fn create(&self, input: NewTestimonial, actor: Option<&Actor>) -> Result<Testimonial> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO testimonials (name, designation, message, image, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.designation)
        .bind(&input.message)
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
        .map_err(|err| map_write_err(err, "Testimonial", "Failed to create testimonial"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Testimonial not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_testimonial")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Testimonial>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT testimonials.* FROM testimonials");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("testimonials.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "testimonials", trash);

        let row = qb
            .build_query_as::<TestimonialRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch testimonial"))?;

        Ok(row.map(row_to_testimonial))
    }

    #[instrument(skip(self, update, actor), name = "db_update_testimonial")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateTestimonial,
        actor: Option<&Actor>,
    ) -> Result<Testimonial> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Testimonial", id))?;

        let name = update.name.unwrap_or(current.name);
        let designation = update.designation.or(current.designation);
        let message = update.message.unwrap_or(current.message);
        let image = update.image.or(current.image);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE testimonials
            SET name = ?, designation = ?, message = ?, image = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&designation)
        .bind(&message)
        .bind(&image)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Testimonial", "Failed to update testimonial"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Testimonial not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "testimonials", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "testimonials.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_testimonials")]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: &StatusFilter,
    ) -> Result<Page<Testimonial>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM testimonials");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count testimonials"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT testimonials.* FROM testimonials");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "testimonials",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<TestimonialRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list testimonials"))?;

        Ok(Page::new(rows.into_iter().map(row_to_testimonial).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_testimonial")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Testimonial> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Testimonial", id))?;

        self.create(
            NewTestimonial {
                name: format!("{} (Copy)", source.name),
                designation: source.designation,
                message: source.message,
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
    async fn test_create_and_duplicate() {
        let repo = TestimonialRepository::new(test_pool().await);
        let source = repo
            .create(
                NewTestimonial {
                    name: "Ada L.".to_string(),
                    designation: Some("Alumna".to_string()),
                    message: "Great course".to_string(),
                    image: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();

        let copy = repo.duplicate(source.id, None).await.unwrap();
        assert_eq!(copy.name, "Ada L. (Copy)");
        assert_eq!(copy.message, "Great course");
        assert!(!copy.status);
    }
}
