use super::{normalize_coin, parse_user, resolve_window, AppState};
use crate::error::AppError;
use crate::services::{PnlQuery, PnlResult};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlParams {
    pub user: String,
    pub coin: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub builder_only: Option<bool>,
    pub max_start_capital: Option<f64>,
}

pub async fn get_pnl(
    Query(params): Query<PnlParams>,
    State(state): State<AppState>,
) -> Result<Json<PnlResult>, AppError> {
    let user = parse_user(&params.user)?;
    let (from_ms, to_ms) = resolve_window(params.from_ms, params.to_ms)?;

    if let Some(cap) = params.max_start_capital {
        if !cap.is_finite() || cap <= 0.0 {
            return Err(AppError::BadRequest(
                "maxStartCapital must be positive".to_string(),
            ));
        }
    }

    let query = PnlQuery {
        user,
        coin: normalize_coin(params.coin),
        from_ms,
        to_ms,
        builder_only: params.builder_only.unwrap_or(false),
        max_start_capital: params.max_start_capital,
    };

    let pnl = state.pnl.calculate_pnl(&query).await?;
    Ok(Json(pnl))
}
