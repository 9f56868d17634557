//! Language repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, Language, NewLanguage, UpdateLanguage};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["languages.name", "languages.code", "languages.native_name"];
const SORT_COLUMNS: &[&str] = &["name", "code", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct LanguageRow {
    id: i64,
    name: String,
    code: String,
    native_name: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_language(row: LanguageRow) -> Language {
    Language {
        id: row.id,
        name: row.name,
        code: row.code,
        native_name: row.native_name,
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
pub struct LanguageRepository {
    pool: DbPool,
}

impl LanguageRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "languages", display: "Language" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(language_code = %input.code), name = "db_create_language")]
    pub async fn create(&self, input: NewLanguage, actor: Option<&Actor>) -> Result<Language> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO languages (name, code, native_name, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.code)
        .bind(&input.native_name)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Language", "Failed to create language"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Language not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_language")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Language>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT languages.* FROM languages");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("languages.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "languages", trash);

        let row = qb
            .build_query_as::<LanguageRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch language"))?;

        Ok(row.map(row_to_language))
    }

    #[instrument(skip(self, update, actor), name = "db_update_language")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateLanguage,
        actor: Option<&Actor>,
    ) -> Result<Language> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Language", id))?;

        let name = update.name.unwrap_or(current.name);
        let code = update.code.unwrap_or(current.code);
        let native_name = update.native_name.or(current.native_name);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE languages
            SET name = ?, code = ?, native_name = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&code)
        .bind(&native_name)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Language", "Failed to update language"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Language not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "languages", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "languages.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_languages")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Language>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM languages");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count languages"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT languages.* FROM languages");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "languages",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<LanguageRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list languages"))?;

        Ok(Page::new(rows.into_iter().map(row_to_language).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_language")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Language> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Language", id))?;

        let code =
            ensure_unique(&self.pool, "languages", "code", source.code.clone(), "-", &[]).await?;

        self.create(
            NewLanguage {
                name: format!("{} (Copy)", source.name),
                code,
                native_name: source.native_name,
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
    async fn test_code_unique_and_duplicate_mutates_it() {
        let repo = LanguageRepository::new(test_pool().await);
        let lang = repo
            .create(
                NewLanguage {
                    name: "English".to_string(),
                    code: "en".to_string(),
                    native_name: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();

        let copy = repo.duplicate(lang.id, None).await.unwrap();
        assert_eq!(copy.name, "English (Copy)");
        assert!(copy.code.starts_with("en-"));
        assert!(!copy.status);
    }
}
