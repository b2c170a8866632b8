//! Health probe

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use crate::state::AppState;

/// Handle `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let status = state.services.health_check().await;

    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if status.is_healthy() { "ok" } else { "degraded" },
        "version": crate::VERSION,
        "issues": status.get_issues(),
    });

    (code, Json(body))
}
