//! Currency repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, Currency, NewCurrency, UpdateCurrency};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["currencies.name", "currencies.code", "currencies.symbol"];
const SORT_COLUMNS: &[&str] = &["name", "code", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct CurrencyRow {
    id: i64,
    name: String,
    code: String,
    symbol: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_currency(row: CurrencyRow) -> Currency {
    Currency {
        id: row.id,
        name: row.name,
        code: row.code,
        symbol: row.symbol,
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
pub struct CurrencyRepository {
    pool: DbPool,
}

impl CurrencyRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "currencies", display: "Currency" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(currency_code = %input.code), name = "db_create_currency")]
    pub async fn create(&self, input: NewCurrency, actor: Option<&Actor>) -> Result<Currency> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO currencies (name, code, symbol, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(input.code.to_uppercase())
        .bind(&input.symbol)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Currency", "Failed to create currency"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Currency not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_currency")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Currency>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT currencies.* FROM currencies");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("currencies.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "currencies", trash);

        let row = qb
            .build_query_as::<CurrencyRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch currency"))?;

        Ok(row.map(row_to_currency))
    }

    #[instrument(skip(self, update, actor), name = "db_update_currency")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateCurrency,
        actor: Option<&Actor>,
    ) -> Result<Currency> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Currency", id))?;

        let name = update.name.unwrap_or(current.name);
        let code = update.code.map(|c| c.to_uppercase()).unwrap_or(current.code);
        let symbol = update.symbol.or(current.symbol);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE currencies
            SET name = ?, code = ?, symbol = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&code)
        .bind(&symbol)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Currency", "Failed to update currency"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Currency not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "currencies", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "currencies.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_currencies")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Currency>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM currencies");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count currencies"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT currencies.* FROM currencies");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "currencies",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<CurrencyRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list currencies"))?;

        Ok(Page::new(rows.into_iter().map(row_to_currency).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_currency")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Currency> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Currency", id))?;

        let name = ensure_unique(
            &self.pool,
            "currencies",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[],
        )
        .await?;
        let code =
            ensure_unique(&self.pool, "currencies", "code", source.code.clone(), "-", &[]).await?;

        self.create(
            NewCurrency { name, code, symbol: source.symbol, status: Some(false) },
            actor,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    fn euro() -> NewCurrency {
        NewCurrency {
            name: "Euro".to_string(),
            code: "eur".to_string(),
            symbol: Some("€".to_string()),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_code_uppercased_and_unique() {
        let repo = CurrencyRepository::new(test_pool().await);
        let currency = repo.create(euro(), None).await.unwrap();
        assert_eq!(currency.code, "EUR");

        let mut again = euro();
        again.name = "Euro 2".to_string();
        assert!(matches!(repo.create(again, None).await.unwrap_err(), Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_mutates_code() {
        let repo = CurrencyRepository::new(test_pool().await);
        let source = repo.create(euro(), None).await.unwrap();

        let copy = repo.duplicate(source.id, None).await.unwrap();
        assert_eq!(copy.name, "Euro (Copy)");
        assert_ne!(copy.code, "EUR");
        assert!(copy.code.starts_with("EUR-"));
    }
}
