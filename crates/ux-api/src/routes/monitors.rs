//! Monitor management: register, list and deregister watched sites.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ux_core::MonitoredSite;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MonitorRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/monitor", get(list_monitors))
        .route("/api/monitor/add", post(add_monitor))
        .route("/api/monitor/remove", post(remove_monitor))
}

/// GET /api/monitor
async fn list_monitors(State(state): State<AppState>) -> Json<Vec<MonitoredSite>> {
    Json(state.registry.list().await)
}

/// POST /api/monitor/add
async fn add_monitor(
    State(state): State<AppState>,
    Json(body): Json<MonitorRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let url = body.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL required".into()));
    }

    state
        .registry
        .add(url)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/monitor/remove
///
/// Removing an unregistered URL is a successful no-op.
async fn remove_monitor(
    State(state): State<AppState>,
    Json(body): Json<MonitorRequest>,
) -> Json<SuccessResponse> {
    if let Some(url) = body.url.as_deref() {
        state.registry.remove(url.trim()).await;
    }
    Json(SuccessResponse { success: true })
}
