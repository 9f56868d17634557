//! Typed per-entity repositories.
//!
//! Each repository owns the entity-specific queries (create, find, update,
//! list, duplicate) and exposes its [`LifecycleTable`] descriptor for the
//! shared soft-delete operations in [`crate::storage::lifecycle`].

pub mod city;
pub mod country;
pub mod course;
pub mod currency;
pub mod faq;
pub mod gallery;
pub mod language;
pub mod news;
pub mod page;
pub mod permission;
pub mod role;
pub mod settings;
pub mod slider;
pub mod state;
pub mod testimonial;
pub mod timezone;
pub mod web_event;

pub use city::{CityFilter, CityRepository};
pub use country::CountryRepository;
pub use course::CourseRepository;
pub use currency::CurrencyRepository;
pub use faq::FaqRepository;
pub use gallery::GalleryRepository;
pub use language::LanguageRepository;
pub use news::NewsRepository;
pub use page::PageRepository;
pub use permission::{PermissionFilter, PermissionRepository};
pub use role::RoleRepository;
pub use settings::SettingsRepository;
pub use slider::SliderRepository;
pub use state::{StateFilter, StateRepository};
pub use testimonial::TestimonialRepository;
pub use timezone::TimezoneRepository;
pub use web_event::WebEventRepository;

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use crate::utils::random_suffix;

/// List filter for entities with no scoped columns beyond the status flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<bool>,
}

/// Map a failed insert/update to a caller-visible error: unique violations
/// become conflicts, foreign key violations become validation failures.
pub(crate) fn map_write_err(err: sqlx::Error, resource: &'static str, context: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::conflict(format!("{} already exists", resource), resource)
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Error::validation(format!("{} references a missing related record", resource))
        }
        _ => Error::database(err, context.to_string()),
    }
}

/// Probe `column` (optionally scoped by extra equality predicates) until
/// `desired` is free, appending a short random suffix on each collision.
/// Used when duplicating rows that carry unique columns.
pub(crate) async fn ensure_unique(
    pool: &DbPool,
    table: &'static str,
    column: &'static str,
    desired: String,
    separator: &str,
    scope: &[(&'static str, i64)],
) -> Result<String> {
    let mut candidate = desired.clone();

    loop {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        qb.push(table).push(" WHERE ").push(column).push(" = ").push_bind(candidate.clone());
        for (scope_column, scope_value) in scope {
            qb.push(" AND ").push(*scope_column).push(" = ").push_bind(*scope_value);
        }

        let taken: i64 = qb.build_query_scalar().fetch_one(pool).await.map_err(|e| {
            Error::database(e, format!("Failed to probe {} uniqueness on {}", column, table))
        })?;

        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{}{}{}", desired, separator, random_suffix(4));
    }
}
