//! City repository.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, City, NewCity, RelatedRef, UpdateCity};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err};

const SEARCH_COLUMNS: &[&str] = &["cities.name", "states.name", "countries.name"];
const SORT_COLUMNS: &[&str] = &["name", "status", "created_at", "updated_at"];

const SELECT: &str = "SELECT cities.*, countries.name AS country_name, states.name AS state_name \
     FROM cities \
     LEFT JOIN countries ON countries.id = cities.country_id \
     LEFT JOIN states ON states.id = cities.state_id";

const COUNT: &str = "SELECT COUNT(*) FROM cities \
     LEFT JOIN countries ON countries.id = cities.country_id \
     LEFT JOIN states ON states.id = cities.state_id";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityFilter {
    pub country_id: Option<i64>,
    pub state_id: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
struct CityRow {
    id: i64,
    country_id: i64,
    state_id: i64,
    name: String,
    status: bool,
    country_name: Option<String>,
    state_name: Option<String>,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_city(row: CityRow) -> City {
    City {
        id: row.id,
        country_id: row.country_id,
        state_id: row.state_id,
        name: row.name,
        status: row.status,
        country: row.country_name.map(|name| RelatedRef { id: row.country_id, name }),
        state: row.state_name.map(|name| RelatedRef { id: row.state_id, name }),
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
pub struct CityRepository {
    pool: DbPool,
}

impl CityRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "cities", display: "City" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(city_name = %input.name), name = "db_create_city")]
    pub async fn create(&self, input: NewCity, actor: Option<&Actor>) -> Result<City> {
        // The state must belong to the given country; the composite unique
        // index alone cannot express that.
        self.check_state_in_country(input.state_id, input.country_id).await?;

        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO cities (country_id, state_id, name, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.country_id)
        .bind(input.state_id)
        .bind(&input.name)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "City", "Failed to create city"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("City not found after creation"))
    }

    async fn check_state_in_country(&self, state_id: i64, country_id: i64) -> Result<()> {
        let matches: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM states WHERE id = ? AND country_id = ? AND deleted_at IS NULL",
        )
        .bind(state_id)
        .bind(country_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to verify state ownership"))?;

        if matches == 0 {
            return Err(Error::validation_field(
                "State does not belong to the given country",
                "state_id",
            ));
        }
        Ok(())
    }

    #[instrument(skip(self), name = "db_get_city")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<City>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("cities.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "cities", trash);

        let row = qb
            .build_query_as::<CityRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch city"))?;

        Ok(row.map(row_to_city))
    }

    #[instrument(skip(self, update, actor), name = "db_update_city")]
    pub async fn update(&self, id: i64, update: UpdateCity, actor: Option<&Actor>) -> Result<City> {
        let current =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("City", id))?;

        let country_id = update.country_id.unwrap_or(current.country_id);
        let state_id = update.state_id.unwrap_or(current.state_id);
        let name = update.name.unwrap_or(current.name);
        let status = update.status.unwrap_or(current.status);
        self.check_state_in_country(state_id, country_id).await?;
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE cities
            SET country_id = ?, state_id = ?, name = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(country_id)
        .bind(state_id)
        .bind(&name)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "City", "Failed to update city"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("City not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &CityFilter,
    ) {
        query::push_trash_filter(qb, w, "cities", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "cities.country_id", filter.country_id);
        query::push_eq(qb, w, "cities.state_id", filter.state_id);
        query::push_eq(qb, w, "cities.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_cities")]
    pub async fn list(&self, params: &ListParams, filter: &CityFilter) -> Result<Page<City>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new(COUNT);
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count cities"))?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "cities",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<CityRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list cities"))?;

        Ok(Page::new(rows.into_iter().map(row_to_city).collect(), total, params))
    }

    #[instrument(skip(self, actor), name = "db_duplicate_city")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<City> {
        let source =
            self.find(id, TrashFilter::Active).await?.ok_or_else(|| Error::not_found("City", id))?;

        let name = ensure_unique(
            &self.pool,
            "cities",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[("country_id", source.country_id), ("state_id", source.state_id)],
        )
        .await?;

        self.create(
            NewCity {
                country_id: source.country_id,
                state_id: source.state_id,
                name,
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
    use crate::domain::{NewCountry, NewState};
    use crate::storage::repositories::{CountryRepository, StateRepository};
    use crate::storage::test_pool;

    async fn seed_geo(pool: &DbPool) -> (i64, i64) {
        let country = CountryRepository::new(pool.clone())
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
            .unwrap();
        let state = StateRepository::new(pool.clone())
            .create(
                NewState {
                    country_id: country.id,
                    name: "Occitanie".to_string(),
                    code: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();
        (country.id, state.id)
    }

    #[tokio::test]
    async fn test_create_resolves_both_references() {
        let pool = test_pool().await;
        let (country_id, state_id) = seed_geo(&pool).await;
        let repo = CityRepository::new(pool);

        let city = repo
            .create(
                NewCity { country_id, state_id, name: "Toulouse".to_string(), status: None },
                None,
            )
            .await
            .unwrap();

        assert_eq!(city.country.unwrap().name, "France");
        assert_eq!(city.state.unwrap().name, "Occitanie");
    }

    #[tokio::test]
    async fn test_state_must_belong_to_country() {
        let pool = test_pool().await;
        let (_, state_id) = seed_geo(&pool).await;
        let other = CountryRepository::new(pool.clone())
            .create(
                NewCountry {
                    name: "Spain".to_string(),
                    iso2: "ES".to_string(),
                    iso3: None,
                    phone_code: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap();

        let repo = CityRepository::new(pool);
        let err = repo
            .create(
                NewCity {
                    country_id: other.id,
                    state_id,
                    name: "Toulouse".to_string(),
                    status: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(ref f), .. } if f == "state_id"));
    }

    #[tokio::test]
    async fn test_duplicate_name_within_scope_conflicts() {
        let pool = test_pool().await;
        let (country_id, state_id) = seed_geo(&pool).await;
        let repo = CityRepository::new(pool);

        let new = || NewCity { country_id, state_id, name: "Toulouse".to_string(), status: None };
        repo.create(new(), None).await.unwrap();
        assert!(matches!(repo.create(new(), None).await.unwrap_err(), Error::Conflict { .. }));
    }
}
