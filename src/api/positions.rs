use super::{normalize_coin, parse_user, resolve_window, AppState};
use crate::domain::PositionState;
use crate::error::AppError;
use crate::services::PositionQuery;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsParams {
    pub user: String,
    pub coin: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub builder_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub positions: Vec<PositionState>,
}

pub async fn get_position_history(
    Query(params): Query<PositionsParams>,
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, AppError> {
    let user = parse_user(&params.user)?;
    let (from_ms, to_ms) = resolve_window(params.from_ms, params.to_ms)?;

    let query = PositionQuery {
        user,
        coin: normalize_coin(params.coin),
        from_ms,
        to_ms,
        builder_only: params.builder_only.unwrap_or(false),
        include_prior: true,
    };

    let positions = state.positions.position_history(&query).await?;
    Ok(Json(PositionsResponse { positions }))
}
