use super::AppState;
use crate::domain::now_ms;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// Probe the upstream datasource and report health.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let timestamp = now_ms();
    match state.source.check_health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "datasource": state.source.name(),
                "timestamp": timestamp,
            })),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "datasource": state.source.name(),
                "timestamp": timestamp,
                "message": err.to_string(),
            })),
        ),
    }
}
