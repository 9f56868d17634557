//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::storage::{check_connection, get_migration_version};

use super::envelope::ApiResponse;
use super::error::ApiError;
use super::routes::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub migration_version: Option<i64>,
}

pub async fn health(
    State(state): State<AppState>,
) -> std::result::Result<Json<ApiResponse<HealthStatus>>, ApiError> {
    check_connection(&state.pool).await?;
    let migration_version = get_migration_version(&state.pool).await?;
    Ok(Json(ApiResponse::ok(
        "Service healthy",
        HealthStatus { status: "ok", version: crate::VERSION, migration_version },
    )))
}
