//! Router assembly and shared application state.

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::PlatformConfig;
use crate::platform::{BlobStore, EnvFileStore, ExternalConfigStore, FsBlobStore};
use crate::storage::DbPool;

use super::auth;
use super::health::health;
use super::public::public_routes;
use super::resource::lifecycle_routes;
use super::resources::{
    CityResource, CountryResource, CourseResource, CurrencyResource, FaqResource,
    GalleryResource, LanguageResource, NewsResource, PageResource, PermissionResource,
    RoleResource, SliderResource, StateResource, TestimonialResource, TimezoneResource,
    WebEventResource,
};
use super::settings::settings_routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub blob_store: Arc<dyn BlobStore>,
    pub env_store: Arc<dyn ExternalConfigStore>,
}

impl AppState {
    /// State with the default filesystem-backed collaborators.
    pub fn new(pool: DbPool, platform: &PlatformConfig) -> Self {
        Self {
            pool,
            blob_store: Arc::new(FsBlobStore::new(&platform.blob_root, &platform.blob_base_url)),
            env_store: Arc::new(EnvFileStore::new(&platform.env_file)),
        }
    }

    /// State with injected collaborators, used by tests.
    pub fn with_collaborators(
        pool: DbPool,
        blob_store: Arc<dyn BlobStore>,
        env_store: Arc<dyn ExternalConfigStore>,
    ) -> Self {
        Self { pool, blob_store, env_store }
    }
}

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .nest("/countries", lifecycle_routes::<CountryResource>())
        .nest("/states", lifecycle_routes::<StateResource>())
        .nest("/cities", lifecycle_routes::<CityResource>())
        .nest("/currencies", lifecycle_routes::<CurrencyResource>())
        .nest("/languages", lifecycle_routes::<LanguageResource>())
        .nest("/timezones", lifecycle_routes::<TimezoneResource>())
        .nest("/roles", lifecycle_routes::<RoleResource>())
        .nest("/permissions", lifecycle_routes::<PermissionResource>())
        .nest("/news", lifecycle_routes::<NewsResource>())
        .nest("/pages", lifecycle_routes::<PageResource>())
        .nest("/events", lifecycle_routes::<WebEventResource>())
        .nest("/courses", lifecycle_routes::<CourseResource>())
        .nest("/testimonials", lifecycle_routes::<TestimonialResource>())
        .nest("/sliders", lifecycle_routes::<SliderResource>())
        .nest("/faqs", lifecycle_routes::<FaqResource>())
        .nest("/galleries", lifecycle_routes::<GalleryResource>())
        .nest("/settings", settings_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin)
        .nest("/api/v1/public", public_routes())
        .layer(middleware::from_fn(auth::with_actor))
        .layer(middleware::from_fn(auth::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}
