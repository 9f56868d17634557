//! State / province repository.
//!
//! States carry their parent country as a shallow reference, resolved with a
//! join so list responses never fan out into per-row lookups.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, NewState, RelatedRef, State, UpdateState};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err};

const SEARCH_COLUMNS: &[&str] = &["states.name", "states.code", "countries.name"];
const SORT_COLUMNS: &[&str] = &["name", "code", "status", "created_at", "updated_at"];

const SELECT: &str = "SELECT states.*, countries.name AS country_name \
     FROM states LEFT JOIN countries ON countries.id = states.country_id";

/// Entity-specific list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateFilter {
    pub country_id: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
struct StateRow {
    id: i64,
    country_id: i64,
    name: String,
    code: Option<String>,
    status: bool,
    country_name: Option<String>,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_state(row: StateRow) -> State {
    let country =
        row.country_name.map(|name| RelatedRef { id: row.country_id, name });
    State {
        id: row.id,
        country_id: row.country_id,
        name: row.name,
        code: row.code,
        status: row.status,
        country,
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
pub struct StateRepository {
    pool: DbPool,
}

impl StateRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "states", display: "State" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(state_name = %input.name), name = "db_create_state")]
    pub async fn create(&self, input: NewState, actor: Option<&Actor>) -> Result<State> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO states (country_id, name, code, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.country_id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "State", "Failed to create state"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("State not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_state")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<State>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("states.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "states", trash);

        let row = qb
            .build_query_as::<StateRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch state"))?;

        Ok(row.map(row_to_state))
    }

    #[instrument(skip(self, update, actor), name = "db_update_state")]
    pub async fn update(&self, id: i64, update: UpdateState, actor: Option<&Actor>) -> Result<State> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("State", id))?;

        let country_id = update.country_id.unwrap_or(current.country_id);
        let name = update.name.unwrap_or(current.name);
        let code = update.code.or(current.code);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE states
            SET country_id = ?, name = ?, code = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(country_id)
        .bind(&name)
        .bind(&code)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "State", "Failed to update state"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("State not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StateFilter,
    ) {
        query::push_trash_filter(qb, w, "states", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "states.country_id", filter.country_id);
        query::push_eq(qb, w, "states.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_states")]
    pub async fn list(&self, params: &ListParams, filter: &StateFilter) -> Result<Page<State>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM states LEFT JOIN countries ON countries.id = states.country_id",
        );
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count states"))?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "states",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<StateRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list states"))?;

        Ok(Page::new(rows.into_iter().map(row_to_state).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_state")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<State> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("State", id))?;

        // Name uniqueness is scoped to the country.
        let name = ensure_unique(
            &self.pool,
            "states",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[("country_id", source.country_id)],
        )
        .await?;

        self.create(
            NewState {
                country_id: source.country_id,
                name,
                code: source.code,
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
    use crate::domain::NewCountry;
    use crate::storage::repositories::CountryRepository;
    use crate::storage::test_pool;

    async fn seed_country(pool: &DbPool) -> i64 {
        CountryRepository::new(pool.clone())
            .create(
                NewCountry {
                    name: "France".to_string(),
                    iso2: "FR".to_string(),
                    iso3: None,
                    phone_code: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_resolves_country_reference() {
        let pool = test_pool().await;
        let country_id = seed_country(&pool).await;
        let repo = StateRepository::new(pool);

        let state = repo
            .create(
                NewState {
                    country_id,
                    name: "Occitanie".to_string(),
                    code: Some("OCC".to_string()),
                    status: None,
                },
                None,
            )
            .await
            .unwrap();

        let country = state.country.expect("country ref");
        assert_eq!(country.id, country_id);
        assert_eq!(country.name, "France");
    }

    #[tokio::test]
    async fn test_create_with_missing_country_is_rejected() {
        let pool = test_pool().await;
        let repo = StateRepository::new(pool);

        let err = repo
            .create(
                NewState { country_id: 999, name: "Nowhere".to_string(), code: None, status: None },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_by_country() {
        let pool = test_pool().await;
        let country_id = seed_country(&pool).await;
        let other = CountryRepository::new(pool.clone())
            .create(
                NewCountry {
                    name: "Germany".to_string(),
                    iso2: "DE".to_string(),
                    iso3: None,
                    phone_code: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap()
            .id;

        let repo = StateRepository::new(pool);
        for (cid, name) in [(country_id, "Occitanie"), (country_id, "Bretagne"), (other, "Bayern")]
        {
            repo.create(
                NewState { country_id: cid, name: name.to_string(), code: None, status: None },
                None,
            )
            .await
            .unwrap();
        }

        let filter = StateFilter { country_id: Some(country_id), ..Default::default() };
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_countries() {
        let pool = test_pool().await;
        let country_id = seed_country(&pool).await;
        let other = CountryRepository::new(pool.clone())
            .create(
                NewCountry {
                    name: "Belgium".to_string(),
                    iso2: "BE".to_string(),
                    iso3: None,
                    phone_code: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap()
            .id;

        let repo = StateRepository::new(pool);
        let new = |cid: i64| NewState {
            country_id: cid,
            name: "Luxembourg".to_string(),
            code: None,
            status: None,
        };

        repo.create(new(country_id), None).await.unwrap();
        repo.create(new(other), None).await.unwrap();
        assert!(matches!(
            repo.create(new(other), None).await.unwrap_err(),
            Error::Conflict { .. }
        ));
    }
}
