use super::{parse_user, AppState};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub user: String,
}

pub async fn list_users(State(state): State<AppState>) -> Json<serde_json::Value> {
    let users: Vec<String> = state
        .registry
        .list()
        .into_iter()
        .map(|u| u.as_str().to_string())
        .collect();
    Json(json!({ "users": users }))
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = parse_user(&body.user)?;

    if state.registry.register(&user) {
        Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "user": user.as_str() })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "user": user.as_str(),
                "message": "User already registered",
            })),
        ))
    }
}

pub async fn unregister_user(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = parse_user(&user)?;

    if state.registry.unregister(&user) {
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "user": user.as_str() })),
        ))
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "user": user.as_str(),
                "message": "User not found",
            })),
        ))
    }
}
