use super::{normalize_coin, resolve_window, AppState};
use crate::error::AppError;
use crate::services::leaderboard::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::services::{Leaderboard, LeaderboardMetric, LeaderboardQuery};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardParams {
    pub metric: Option<String>,
    pub coin: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub builder_only: Option<bool>,
    pub max_start_capital: Option<f64>,
    pub limit: Option<usize>,
}

pub async fn get_leaderboard(
    Query(params): Query<LeaderboardParams>,
    State(state): State<AppState>,
) -> Result<Json<Leaderboard>, AppError> {
    let metric = params
        .metric
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("metric is required".to_string()))?;
    let metric = LeaderboardMetric::from_str(metric).map_err(|_| {
        AppError::BadRequest("metric must be one of: volume, pnl, returnPct".to_string())
    })?;

    let (from_ms, to_ms) = resolve_window(params.from_ms, params.to_ms)?;

    if let Some(cap) = params.max_start_capital {
        if !cap.is_finite() || cap <= 0.0 {
            return Err(AppError::BadRequest(
                "maxStartCapital must be positive".to_string(),
            ));
        }
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let query = LeaderboardQuery {
        metric,
        coin: normalize_coin(params.coin),
        from_ms,
        to_ms,
        builder_only: params.builder_only.unwrap_or(false),
        max_start_capital: params.max_start_capital,
        limit,
    };

    let board = state.leaderboard.get_leaderboard(&query).await;
    Ok(Json(board))
}
