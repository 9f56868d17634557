//! Country repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::domain::{Actor, AuditStamp, Country, NewCountry, UpdateCountry};
use crate::errors::{Error, Result};
use crate::storage::lifecycle::LifecycleTable;
use crate::storage::query::{self, ListParams, Page, TrashFilter, WherePrefix};
use crate::storage::DbPool;

use super::{ensure_unique, map_write_err, StatusFilter};

const SEARCH_COLUMNS: &[&str] = &["countries.name", "countries.iso2", "countries.iso3"];
const SORT_COLUMNS: &[&str] = &["name", "iso2", "status", "created_at", "updated_at"];

#[derive(Debug, Clone, FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    iso2: String,
    iso3: Option<String>,
    phone_code: Option<String>,
    status: bool,
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_country(row: CountryRow) -> Country {
    Country {
        id: row.id,
        name: row.name,
        iso2: row.iso2,
        iso3: row.iso3,
        phone_code: row.phone_code,
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
pub struct CountryRepository {
    pool: DbPool,
}

impl CountryRepository {
    pub const TABLE: LifecycleTable = LifecycleTable { table: "countries", display: "Country" };

    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, input, actor), fields(country_name = %input.name), name = "db_create_country")]
    pub async fn create(&self, input: NewCountry, actor: Option<&Actor>) -> Result<Country> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        let result = sqlx::query(
            r#"
            INSERT INTO countries (name, iso2, iso3, phone_code, status,
                created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(input.iso2.to_uppercase())
        .bind(input.iso3.as_ref().map(|c| c.to_uppercase()))
        .bind(&input.phone_code)
        .bind(input.status.unwrap_or(true))
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Country", "Failed to create country"))?;

        self.find(result.last_insert_rowid(), TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Country not found after creation"))
    }

    #[instrument(skip(self), name = "db_get_country")]
    pub async fn find(&self, id: i64, trash: TrashFilter) -> Result<Option<Country>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT countries.* FROM countries");
        let mut w = WherePrefix::default();
        qb.push(w.next()).push("countries.id = ").push_bind(id);
        query::push_trash_filter(&mut qb, &mut w, "countries", trash);

        let row = qb
            .build_query_as::<CountryRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch country"))?;

        Ok(row.map(row_to_country))
    }

    #[instrument(skip(self, update, actor), name = "db_update_country")]
    pub async fn update(
        &self,
        id: i64,
        update: UpdateCountry,
        actor: Option<&Actor>,
    ) -> Result<Country> {
        let current = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Country", id))?;

        let name = update.name.unwrap_or(current.name);
        let iso2 = update.iso2.map(|c| c.to_uppercase()).unwrap_or(current.iso2);
        let iso3 = update.iso3.map(|c| c.to_uppercase()).or(current.iso3);
        let phone_code = update.phone_code.or(current.phone_code);
        let status = update.status.unwrap_or(current.status);
        let stamp = AuditStamp::from_actor(actor);

        sqlx::query(
            r#"
            UPDATE countries
            SET name = ?, iso2 = ?, iso3 = ?, phone_code = ?, status = ?,
                updated_by = COALESCE(?, updated_by),
                updated_by_name = COALESCE(?, updated_by_name),
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&name)
        .bind(&iso2)
        .bind(&iso3)
        .bind(&phone_code)
        .bind(status)
        .bind(stamp.id)
        .bind(&stamp.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, "Country", "Failed to update country"))?;

        self.find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::internal("Country not found after update"))
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        w: &mut WherePrefix,
        params: &ListParams,
        filter: &StatusFilter,
    ) {
        query::push_trash_filter(qb, w, "countries", params.trash_filter());
        if let Some(term) = params.search_term() {
            query::push_search(qb, w, SEARCH_COLUMNS, term);
        }
        query::push_eq(qb, w, "countries.status", filter.status);
    }

    #[instrument(skip(self, params, filter), name = "db_list_countries")]
    pub async fn list(&self, params: &ListParams, filter: &StatusFilter) -> Result<Page<Country>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM countries");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut count_qb, &mut w, params, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count countries"))?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT countries.* FROM countries");
        let mut w = WherePrefix::default();
        Self::push_filters(&mut qb, &mut w, params, filter);
        query::push_order(
            &mut qb,
            "countries",
            params.sort_by.as_deref(),
            SORT_COLUMNS,
            params.sort_direction,
        );
        query::push_paging(&mut qb, params);

        let rows = qb
            .build_query_as::<CountryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to list countries"))?;

        Ok(Page::new(rows.into_iter().map(row_to_country).collect(), total, params))
    }

    /// Copy an active country into a new inactive row. Unique columns get a
    /// copy marker or random suffix so the insert cannot collide.
    #[instrument(skip(self, actor), name = "db_duplicate_country")]
    pub async fn duplicate(&self, id: i64, actor: Option<&Actor>) -> Result<Country> {
        let source = self
            .find(id, TrashFilter::Active)
            .await?
            .ok_or_else(|| Error::not_found("Country", id))?;

        let name = ensure_unique(
            &self.pool,
            "countries",
            "name",
            format!("{} (Copy)", source.name),
            " ",
            &[],
        )
        .await?;
        let iso2 = ensure_unique(&self.pool, "countries", "iso2", source.iso2.clone(), "-", &[])
            .await?;

        self.create(
            NewCountry {
                name,
                iso2,
                iso3: source.iso3,
                phone_code: source.phone_code,
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

    fn france() -> NewCountry {
        NewCountry {
            name: "France".to_string(),
            iso2: "fr".to_string(),
            iso3: Some("fra".to_string()),
            phone_code: Some("+33".to_string()),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_codes_and_stamps_actor() {
        let repo = CountryRepository::new(test_pool().await);
        let actor = Actor::new(3, "Dean Admin");

        let country = repo.create(france(), Some(&actor)).await.unwrap();
        assert_eq!(country.iso2, "FR");
        assert_eq!(country.iso3.as_deref(), Some("FRA"));
        assert!(country.status);
        assert_eq!(country.created_by, Some(3));
        assert_eq!(country.created_by_name.as_deref(), Some("Dean Admin"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = CountryRepository::new(test_pool().await);
        repo.create(france(), None).await.unwrap();

        let err = repo.create(france(), None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_partial_patch() {
        let repo = CountryRepository::new(test_pool().await);
        let country = repo.create(france(), None).await.unwrap();

        let patch = UpdateCountry { phone_code: Some("+590".to_string()), ..Default::default() };
        let updated = repo.update(country.id, patch, None).await.unwrap();

        assert_eq!(updated.name, "France");
        assert_eq!(updated.phone_code.as_deref(), Some("+590"));
    }

    #[tokio::test]
    async fn test_list_search_and_status_filter() {
        let repo = CountryRepository::new(test_pool().await);
        repo.create(france(), None).await.unwrap();
        repo.create(
            NewCountry {
                name: "Germany".to_string(),
                iso2: "DE".to_string(),
                iso3: None,
                phone_code: None,
                status: Some(false),
            },
            None,
        )
        .await
        .unwrap();

        let params = ListParams { search: Some("fran".to_string()), ..Default::default() };
        let page = repo.list(&params, &StatusFilter::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "France");

        let active_only = StatusFilter { status: Some(true) };
        let page = repo.list(&ListParams::default(), &active_only).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_duplicate_creates_inactive_copy() {
        let repo = CountryRepository::new(test_pool().await);
        let source = repo.create(france(), None).await.unwrap();

        let copy = repo.duplicate(source.id, None).await.unwrap();
        assert_eq!(copy.name, "France (Copy)");
        assert_ne!(copy.iso2, source.iso2);
        assert!(copy.iso2.starts_with("FR"));
        assert!(!copy.status);
    }
}
