//! Currencies, languages, and timezones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{ISO3_REGEX, LANGUAGE_CODE_REGEX};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub name: String,
    /// ISO 4217 code, globally unique.
    pub code: String,
    pub symbol: Option<String>,
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
pub struct NewCurrency {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(regex(path = *ISO3_REGEX, message = "must be a three-letter code"))]
    pub code: String,
    #[validate(length(max = 8))]
    pub symbol: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCurrency {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(regex(path = *ISO3_REGEX, message = "must be a three-letter code"))]
    pub code: Option<String>,
    #[validate(length(max = 8))]
    pub symbol: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub name: String,
    /// BCP 47 style tag, globally unique.
    pub code: String,
    pub native_name: Option<String>,
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
pub struct NewLanguage {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(regex(path = *LANGUAGE_CODE_REGEX, message = "must be a language tag like 'en' or 'pt-BR'"))]
    pub code: String,
    #[validate(length(max = 120))]
    pub native_name: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLanguage {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(regex(path = *LANGUAGE_CODE_REGEX, message = "must be a language tag like 'en' or 'pt-BR'"))]
    pub code: Option<String>,
    #[validate(length(max = 120))]
    pub native_name: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timezone {
    pub id: i64,
    /// IANA zone name, e.g. "Europe/Berlin"; globally unique.
    pub name: String,
    pub utc_offset: Option<String>,
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
pub struct NewTimezone {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 16))]
    pub utc_offset: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTimezone {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 16))]
    pub utc_offset: Option<String>,
    pub status: Option<bool>,
}
