//! Geographic reference data: countries, states, cities.
//!
//! The three levels form a simple foreign-key hierarchy. Name uniqueness is
//! scoped: country names globally, state names within a country, city names
//! within a country+state pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{ISO2_REGEX, ISO3_REGEX};

/// Shallow reference to a related entity, embedded in list/show responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso2: String,
    pub iso3: Option<String>,
    pub phone_code: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCountry {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(regex(path = *ISO2_REGEX, message = "must be a two-letter code"))]
    pub iso2: String,
    #[validate(regex(path = *ISO3_REGEX, message = "must be a three-letter code"))]
    pub iso3: Option<String>,
    #[validate(length(max = 8))]
    pub phone_code: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCountry {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(regex(path = *ISO2_REGEX, message = "must be a two-letter code"))]
    pub iso2: Option<String>,
    #[validate(regex(path = *ISO3_REGEX, message = "must be a three-letter code"))]
    pub iso3: Option<String>,
    #[validate(length(max = 8))]
    pub phone_code: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: i64,
    pub country_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub status: bool,
    pub country: Option<RelatedRef>,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewState {
    #[validate(range(min = 1))]
    pub country_id: i64,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 16))]
    pub code: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateState {
    #[validate(range(min = 1))]
    pub country_id: Option<i64>,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 16))]
    pub code: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub country_id: i64,
    pub state_id: i64,
    pub name: String,
    pub status: bool,
    pub country: Option<RelatedRef>,
    pub state: Option<RelatedRef>,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCity {
    #[validate(range(min = 1))]
    pub country_id: i64,
    #[validate(range(min = 1))]
    pub state_id: i64,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCity {
    #[validate(range(min = 1))]
    pub country_id: Option<i64>,
    #[validate(range(min = 1))]
    pub state_id: Option<i64>,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub status: Option<bool>,
}
