//! Balancer handlers

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use balancer_core::{BalancerError, RouteTarget};

use crate::state::AppState;

/// Response header carrying the resolved target type.
fn x_target() -> HeaderName {
    HeaderName::from_static("x-target")
}

/// Response header echoing the input URL.
fn x_original_url() -> HeaderName {
    HeaderName::from_static("x-original-url")
}

#[derive(Deserialize)]
pub struct BalanceQuery {
    /// Video URL to balance.
    pub video: String,
}

#[derive(Deserialize)]
pub struct BalanceRequest {
    pub video: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub redirect_url: String,
    pub target: RouteTarget,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub request_counter: u64,
    pub balancer_status: &'static str,
}

/// Main balancer endpoint.
///
/// Example: `GET /?video=http://s1.origin-cluster/video/1488/xcg2djHckad.m3u8`
///
/// Replies with a 301 redirect to the computed target; `X-Target` carries
/// the target type and `X-Original-URL` the input URL.
pub async fn balance_video_request(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Response, (StatusCode, String)> {
    let decision = state
        .balancer()
        .balance(&query.video)
        .await
        .map_err(map_balance_err)?;

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [
            (header::LOCATION, decision.url),
            (x_target(), decision.target.as_str().to_string()),
            (x_original_url(), query.video),
        ],
    )
        .into_response())
}

/// JSON variant of the balance operation.
pub async fn balance_video_request_json(
    State(state): State<AppState>,
    Json(payload): Json<BalanceRequest>,
) -> Result<Json<BalanceResponse>, (StatusCode, String)> {
    let decision = state
        .balancer()
        .balance(&payload.video)
        .await
        .map_err(map_balance_err)?;

    Ok(Json(BalanceResponse {
        redirect_url: decision.url,
        target: decision.target,
    }))
}

/// Current balancer statistics.
pub async fn get_balancer_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        request_counter: state.balancer().request_count(),
        balancer_status: "active",
    })
}

/// Reset the balancer request counter.
pub async fn reset_balancer_counter(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.balancer().reset_counter();
    Json(serde_json::json!({"message": "Balancer counter reset successfully"}))
}

fn map_balance_err(err: BalancerError) -> (StatusCode, String) {
    match err {
        BalancerError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}
