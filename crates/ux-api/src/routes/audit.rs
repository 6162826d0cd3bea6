//! Audit endpoints: one-off scans and advisory fixes, plus the
//! API-key-gated `/api/v1` variants.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use ux_core::{ScanError, ScanResult, Scanner};

use crate::error::ApiError;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct FixResponse {
    pub status: &'static str,
    pub fix: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    run_scan(&state, body).await
}

/// POST /fix
///
/// Never surfaces an error: the engine substitutes a fallback snippet when
/// the narrative service is missing or failing.
pub async fn fix(State(state): State<AppState>) -> Json<FixResponse> {
    Json(FixResponse {
        status: "success",
        fix: state.scanner.suggest_fix().await,
    })
}

/// GET /api/v1/health
pub async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "UX Tester API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/v1/scan
pub async fn api_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    require_api_key(&state, &headers)?;
    run_scan(&state, body).await
}

/// POST /api/v1/fix
pub async fn api_fix(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FixResponse>, ApiError> {
    require_api_key(&state, &headers)?;
    Ok(Json(FixResponse {
        status: "success",
        fix: state.scanner.suggest_fix().await,
    }))
}

fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if state.validator.authorize(key) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(
            "Unauthorized. Invalid or missing API Key.".into(),
        ))
    }
}

async fn run_scan(state: &AppState, body: ScanRequest) -> Result<Json<ScanResult>, ApiError> {
    let url = body.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL required".into()));
    }

    match state.scanner.scan(url).await {
        Ok(result) => Ok(Json(result)),
        Err(ScanError::EmptyUrl) => Err(ApiError::BadRequest("URL required".into())),
        Err(ScanError::Failed(message)) => Err(ApiError::Internal(message)),
    }
}
