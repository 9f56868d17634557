//! # HTTP API
//!
//! REST surface for the admin console and public site. One generic handler
//! set covers every lifecycle-managed entity; settings, public reads, and
//! health have dedicated handlers. All responses share the
//! `{success, message, data}` envelope.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod health;
pub mod public;
pub mod resource;
pub mod resources;
pub mod routes;
pub mod server;
pub mod settings;

pub use auth::CurrentActor;
pub use envelope::{ApiResponse, PageLink, Pagination};
pub use error::ApiError;
pub use resource::{lifecycle_routes, LifecycleResource};
pub use routes::{build_router, AppState};
pub use server::start_api_server;
