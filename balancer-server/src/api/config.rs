//! Admin configuration handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use balancer_core::models::{ConfigPatch, NewConfig};
use balancer_core::repository::RepositoryError;
use balancer_core::ConfigRecord;

use crate::state::AppState;

/// Total the two ratios must add up to on the admin surface.
const RATIO_TOTAL: u32 = 10;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Get the currently active balancer configuration.
pub async fn get_active_config(
    State(state): State<AppState>,
) -> Result<Json<ConfigRecord>, (StatusCode, String)> {
    match state.repository().get_active().await {
        Ok(Some(config)) => Ok(Json(config)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            "No active configuration found".to_string(),
        )),
        Err(err) => Err(map_repo_err(err)),
    }
}

/// Get all balancer configurations.
pub async fn get_all_configs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConfigRecord>>, (StatusCode, String)> {
    state
        .repository()
        .list()
        .await
        .map(Json)
        .map_err(map_repo_err)
}

pub async fn get_config_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ConfigRecord>, (StatusCode, String)> {
    match state.repository().get_by_id(id).await {
        Ok(Some(config)) => Ok(Json(config)),
        Ok(None) => Err(not_found()),
        Err(err) => Err(map_repo_err(err)),
    }
}

/// Create a new configuration; it becomes the active one.
pub async fn create_config(
    State(state): State<AppState>,
    Json(payload): Json<NewConfig>,
) -> Result<Json<ConfigRecord>, (StatusCode, String)> {
    check_ratios(payload.cdn_ratio, payload.origin_ratio)?;

    state
        .repository()
        .create(payload)
        .await
        .map(Json)
        .map_err(map_repo_err)
}

/// Partial update of a configuration.
pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<ConfigRecord>, (StatusCode, String)> {
    if let (Some(cdn_ratio), Some(origin_ratio)) = (patch.cdn_ratio, patch.origin_ratio) {
        check_ratios(cdn_ratio, origin_ratio)?;
    }

    match state.repository().update(id, patch).await {
        Ok(Some(config)) => Ok(Json(config)),
        Ok(None) => Err(not_found()),
        Err(err) => Err(map_repo_err(err)),
    }
}

pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    match state.repository().delete(id).await {
        Ok(true) => Ok(Json(DeleteResponse {
            message: "Configuration deleted successfully".to_string(),
        })),
        Ok(false) => Err(not_found()),
        Err(err) => Err(map_repo_err(err)),
    }
}

/// Make a configuration the single active one.
pub async fn activate_config(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ConfigRecord>, (StatusCode, String)> {
    match state.repository().activate(id).await {
        Ok(Some(config)) => Ok(Json(config)),
        Ok(None) => Err(not_found()),
        Err(err) => Err(map_repo_err(err)),
    }
}

fn check_ratios(cdn_ratio: u32, origin_ratio: u32) -> Result<(), (StatusCode, String)> {
    if cdn_ratio == 0 || origin_ratio == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Ratios must be at least 1".to_string(),
        ));
    }
    if cdn_ratio + origin_ratio != RATIO_TOTAL {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("CDN ratio + Origin ratio must equal {RATIO_TOTAL}"),
        ));
    }
    Ok(())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Configuration not found".to_string())
}

fn map_repo_err(err: RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}
