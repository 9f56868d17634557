//! Generic lifecycle endpoints.
//!
//! Every lifecycle-managed entity exposes the same fifteen operations; the
//! `LifecycleResource` trait is the seam between one shared handler set and
//! the per-entity repositories. Shared trash/bulk/statistics behavior runs
//! through `storage::lifecycle` keyed by the resource's table descriptor.

use std::future::Future;

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use crate::domain::{Actor, LifecycleStatistics};
use crate::errors::{Error, Result};
use crate::storage::lifecycle;
use crate::storage::{DbPool, LifecycleTable, ListParams, Page, TrashFilter};

use super::auth::CurrentActor;
use super::envelope::ApiResponse;
use super::error::ApiError;
use super::routes::AppState;

/// One lifecycle-managed entity as seen by the HTTP layer.
pub trait LifecycleResource: Send + Sync + 'static {
    /// Table descriptor shared with `storage::lifecycle`.
    const TABLE: LifecycleTable;
    /// URL segment the resource is mounted under (`/api/v1/admin/{SEGMENT}`).
    const SEGMENT: &'static str;

    type Entity: Serialize + Send + Sync + 'static;
    type New: DeserializeOwned + Validate + Send + 'static;
    type Update: DeserializeOwned + Validate + Send + 'static;
    type Filter: DeserializeOwned + Send + Sync + 'static;

    fn list(
        pool: &DbPool,
        params: &ListParams,
        filter: &Self::Filter,
    ) -> impl Future<Output = Result<Page<Self::Entity>>> + Send;

    fn create(
        pool: &DbPool,
        input: Self::New,
        actor: Option<&Actor>,
    ) -> impl Future<Output = Result<Self::Entity>> + Send;

    fn find(
        pool: &DbPool,
        id: i64,
        trash: TrashFilter,
    ) -> impl Future<Output = Result<Option<Self::Entity>>> + Send;

    fn update(
        pool: &DbPool,
        id: i64,
        update: Self::Update,
        actor: Option<&Actor>,
    ) -> impl Future<Output = Result<Self::Entity>> + Send;

    fn duplicate(
        pool: &DbPool,
        id: i64,
        actor: Option<&Actor>,
    ) -> impl Future<Output = Result<Self::Entity>> + Send;

    /// Blob paths owned by an entity, cleaned up after a force delete.
    fn blob_paths(_entity: &Self::Entity) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct IdList {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatus {
    pub ids: Vec<i64>,
    pub status: bool,
}

/// Trash visibility flags accepted by single-record reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrashParams {
    pub include_trashed: bool,
    pub only_trashed: bool,
}

impl TrashParams {
    fn filter(&self) -> TrashFilter {
        if self.only_trashed {
            TrashFilter::OnlyTrashed
        } else if self.include_trashed {
            TrashFilter::WithTrashed
        } else {
            TrashFilter::Active
        }
    }
}

fn base_path<R: LifecycleResource>() -> String {
    format!("/api/v1/admin/{}", R::SEGMENT)
}

fn cleanup_blobs<R: LifecycleResource>(state: &AppState, entity: &R::Entity) {
    for path in R::blob_paths(entity) {
        if let Err(err) = state.blob_store.delete(&path) {
            warn!(blob_path = %path, error = %err, "Failed to delete blob after force delete");
        }
    }
}

async fn list<R: LifecycleResource>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<R::Filter>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Json<ApiResponse<Vec<R::Entity>>>, ApiError> {
    let page = R::list(&state.pool, &params, &filter).await?;
    let message = format!("{} list retrieved successfully", R::TABLE.display);
    Ok(Json(ApiResponse::paginated(message, &base_path::<R>(), query.as_deref(), page)))
}

async fn create<R: LifecycleResource>(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<R::New>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let entity = R::create(&state.pool, input, actor.as_ref()).await?;
    let message = format!("{} created successfully", R::TABLE.display);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, entity))))
}

async fn show<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(trash): Query<TrashParams>,
) -> std::result::Result<Json<ApiResponse<R::Entity>>, ApiError> {
    let entity = R::find(&state.pool, id, trash.filter())
        .await?
        .ok_or_else(|| Error::not_found(R::TABLE.display, id))?;
    let message = format!("{} retrieved successfully", R::TABLE.display);
    Ok(Json(ApiResponse::ok(message, entity)))
}

async fn update<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<R::Update>,
) -> std::result::Result<Json<ApiResponse<R::Entity>>, ApiError> {
    input.validate()?;
    let entity = R::update(&state.pool, id, input, actor.as_ref()).await?;
    let message = format!("{} updated successfully", R::TABLE.display);
    Ok(Json(ApiResponse::ok(message, entity)))
}

async fn destroy<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    lifecycle::soft_delete(&state.pool, &R::TABLE, id).await?;
    Ok(Json(ApiResponse::message_only(format!("{} moved to trash", R::TABLE.display))))
}

async fn restore<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> std::result::Result<Json<ApiResponse<R::Entity>>, ApiError> {
    lifecycle::restore(&state.pool, &R::TABLE, id, actor.as_ref()).await?;
    let entity = R::find(&state.pool, id, TrashFilter::Active)
        .await?
        .ok_or_else(|| Error::internal(format!("{} not found after restore", R::TABLE.display)))?;
    let message = format!("{} restored successfully", R::TABLE.display);
    Ok(Json(ApiResponse::ok(message, entity)))
}

async fn force_destroy<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    // Fetch first so owned blobs can be cleaned up once the row is gone.
    let trashed = R::find(&state.pool, id, TrashFilter::OnlyTrashed).await?;
    lifecycle::force_delete(&state.pool, &R::TABLE, id).await?;
    if let Some(entity) = trashed {
        cleanup_blobs::<R>(&state, &entity);
    }
    Ok(Json(ApiResponse::message_only(format!("{} permanently deleted", R::TABLE.display))))
}

async fn toggle_status<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> std::result::Result<Json<ApiResponse<R::Entity>>, ApiError> {
    lifecycle::toggle_status(&state.pool, &R::TABLE, id, actor.as_ref()).await?;
    let entity = R::find(&state.pool, id, TrashFilter::Active).await?.ok_or_else(|| {
        Error::internal(format!("{} not found after status toggle", R::TABLE.display))
    })?;
    let message = format!("{} status updated successfully", R::TABLE.display);
    Ok(Json(ApiResponse::ok(message, entity)))
}

async fn duplicate<R: LifecycleResource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let entity = R::duplicate(&state.pool, id, actor.as_ref()).await?;
    let message = format!("{} duplicated successfully", R::TABLE.display);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, entity))))
}

async fn bulk_destroy<R: LifecycleResource>(
    State(state): State<AppState>,
    Json(body): Json<IdList>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    let affected = lifecycle::bulk_soft_delete(&state.pool, &R::TABLE, &body.ids).await?;
    Ok(Json(ApiResponse::message_only(format!("{} records moved to trash", affected))))
}

async fn bulk_restore<R: LifecycleResource>(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(body): Json<IdList>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    let affected =
        lifecycle::bulk_restore(&state.pool, &R::TABLE, &body.ids, actor.as_ref()).await?;
    Ok(Json(ApiResponse::message_only(format!("{} records restored", affected))))
}

async fn bulk_force_destroy<R: LifecycleResource>(
    State(state): State<AppState>,
    Json(body): Json<IdList>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    let mut doomed = Vec::new();
    for id in &body.ids {
        if let Some(entity) = R::find(&state.pool, *id, TrashFilter::OnlyTrashed).await? {
            doomed.push(entity);
        }
    }
    let affected = lifecycle::bulk_force_delete(&state.pool, &R::TABLE, &body.ids).await?;
    for entity in &doomed {
        cleanup_blobs::<R>(&state, entity);
    }
    Ok(Json(ApiResponse::message_only(format!("{} records permanently deleted", affected))))
}

async fn bulk_status<R: LifecycleResource>(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(body): Json<BulkStatus>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    let affected = lifecycle::bulk_update_status(
        &state.pool,
        &R::TABLE,
        &body.ids,
        body.status,
        actor.as_ref(),
    )
    .await?;
    Ok(Json(ApiResponse::message_only(format!("{} records updated", affected))))
}

async fn empty_trash<R: LifecycleResource>(
    State(state): State<AppState>,
) -> std::result::Result<Json<ApiResponse<()>>, ApiError> {
    let affected = lifecycle::empty_trash(&state.pool, &R::TABLE).await?;
    Ok(Json(ApiResponse::message_only(format!("{} records permanently deleted", affected))))
}

async fn statistics<R: LifecycleResource>(
    State(state): State<AppState>,
) -> std::result::Result<Json<ApiResponse<LifecycleStatistics>>, ApiError> {
    let stats = lifecycle::statistics(&state.pool, &R::TABLE).await?;
    Ok(Json(ApiResponse::ok("Statistics retrieved successfully", stats)))
}

/// The full admin route set for one lifecycle resource.
pub fn lifecycle_routes<R: LifecycleResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/statistics/overview", get(statistics::<R>))
        .route("/empty-trash", delete(empty_trash::<R>))
        .route("/bulk-destroy", delete(bulk_destroy::<R>))
        .route("/bulk-restore", patch(bulk_restore::<R>))
        .route("/bulk-force-destroy", delete(bulk_force_destroy::<R>))
        .route("/bulk-status", patch(bulk_status::<R>))
        .route("/{id}", get(show::<R>).put(update::<R>).patch(update::<R>).delete(destroy::<R>))
        .route("/{id}/restore", patch(restore::<R>))
        .route("/{id}/force-destroy", delete(force_destroy::<R>))
        .route("/{id}/toggle-status", patch(toggle_status::<R>))
        .route("/{id}/duplicate", post(duplicate::<R>))
}
