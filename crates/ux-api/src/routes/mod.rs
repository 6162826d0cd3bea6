pub mod audit;
pub mod monitors;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// The authenticated public API, nested under `/api/v1`.
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(audit::api_health))
        .route("/scan", post(audit::api_scan))
        .route("/fix", post(audit::api_fix))
}
