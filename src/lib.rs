//! # Campanile
//!
//! Content-management backend for an institutional website: reference data
//! (geography, currencies, languages, timezones), access-control catalogs,
//! web content (news, pages, events, testimonials, sliders, FAQs, gallery),
//! and singleton site settings. Every entity shares one soft-delete
//! lifecycle with bulk operations, statistics, and duplication; everything
//! is served over a uniform REST envelope.

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod platform;
pub mod storage;
pub mod utils;

pub use errors::{Error, Result};

/// Version of the Campanile backend
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
