use super::{normalize_coin, parse_user, resolve_window, AppState};
use crate::domain::Trade;
use crate::error::AppError;
use crate::services::{CollapseKey, TradeQuery};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesParams {
    pub user: String,
    pub coin: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub builder_only: Option<bool>,
    pub collapse_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub trades: Vec<Trade>,
}

pub async fn get_trades(
    Query(params): Query<TradesParams>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let user = parse_user(&params.user)?;
    let (from_ms, to_ms) = resolve_window(params.from_ms, params.to_ms)?;

    let collapse_by = match params.collapse_by.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(raw) => Some(CollapseKey::from_str(raw).map_err(|_| {
            AppError::BadRequest("collapseBy must be one of: hash, oid, tid".to_string())
        })?),
    };

    let query = TradeQuery {
        user,
        coin: normalize_coin(params.coin),
        from_ms,
        to_ms,
        builder_only: params.builder_only.unwrap_or(false),
        collapse_by,
    };

    let trades = state.trades.get_trades(&query).await?;
    Ok(Json(TradesResponse { trades }))
}
