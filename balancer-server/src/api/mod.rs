//! API Routes
//!
//! The balancer surface mirrors the public endpoints, the `/srv/config`
//! routes carry the admin CRUD for split configurations.

mod balancer;
mod config;


use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Balancer
        .route("/", get(balancer::balance_video_request))
        .route("/balance", post(balancer::balance_video_request_json))
        .route("/stats", get(balancer::get_balancer_stats))
        .route("/reset", post(balancer::reset_balancer_counter))
        // Admin config CRUD
        .route("/srv/config", get(config::get_active_config))
        .route("/srv/config", post(config::create_config))
        .route("/srv/config/all", get(config::get_all_configs))
        .route("/srv/config/:id", get(config::get_config_by_id))
        .route("/srv/config/:id", put(config::update_config))
        .route("/srv/config/:id", delete(config::delete_config))
        .route("/srv/config/:id/activate", post(config::activate_config))
        // Health
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .fallback(api_not_found)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Not found"})),
    )
}
