//! FAQ repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, Faq, NewFaq, UpdateFaq};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["faqs.question", "faqs.answer"];
const SORT_COLUMNS: &[&str] = &["question", "sort_order", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct FaqRow {
    id: i64,
    question: String,
    answer: String,
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

fn row_to_faq(row: FaqRow) -> Faq {
    Faq {
        id: row.id,
        question: row.question,
        answer: row.answer,
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
pub struct FaqRepository {
    pool: DbPool,
}

impl FaqRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "faqs", display: "Faq" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), name = "db_create_faq")]
    pub async fn create(&self, input: NewFaq, actor: Option<&Actor>) -> Result<Faq> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO faqs (question, answer, sort_order, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.question)
        .bind(&input.answer)
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
        .map_err(|err| map_write_err(err, "Faq", "Failed to create FAQ"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("FAQ not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_faq")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Faq>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT faqs.* FROM faqs");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("faqs.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "faqs", trash);

        let row = qb
            .build_query_as::<FaqRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch FAQ"))?;

        Ok(row.map(row_to_faq))
    }

    #[instrument(skip(self, update, actor), name = "db_update_faq")]
    pub async fn update(&self, id: i64, update: UpdateFaq, actor: Option<&Actor>) -> Result<Faq> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Faq", id))?;

        let question = update.question.unwrap_or(current.question);
        let answer = update.answer.unwrap_or(current.answer);
        let sort_order = update.sort_order.unwrap_or(current.sort_order);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE faqs
            SET question = ?, answer = ?, sort_order = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&question)
        .bind(&answer)
        .bind(sort_order)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Faq", "Failed to update FAQ"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("FAQ not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "faqs", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "faqs.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_faqs")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Faq>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM faqs");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count FAQs"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT faqs.* FROM faqs");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "faqs",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<FaqRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list FAQs"))?;

        Ok(Page::new(rows.into_iter().map(row_to_faq).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_faq")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Faq> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("Faq", id))?;

        self.create(
            NewFaq {
                question: format!("{} (Copy)", source.question),
                answer: source.answer,
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
    async fn test_create_and_update() {
        let repo = FaqRepository::new(test_pool().await);
        let faq = repo
            .create(
                NewFaq {
                    question: "How do I enrol?".to_string(),
                    answer: "Apply online.".to_string(),
                    sort_order: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(faq.sort_order, 0);

        let updated = repo
            .update(
                faq.id,
                UpdateFaq { answer: Some("Visit the admissions office.".to_string()), ..Default::default() },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.question, "How do I enrol?");
        assert_eq!(updated.answer, "Visit the admissions office.");
    }
}
