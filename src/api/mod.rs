//! HTTP surface: query parsing, validation, dispatch to the services.

pub mod health;
pub mod leaderboard;
pub mod pnl;
pub mod positions;
pub mod trades;
pub mod users;

use crate::datasource::DataSource;
use crate::domain::{now_ms, Address};
use crate::error::AppError;
use crate::services::{
    LeaderboardService, PnlService, PositionService, TradeService, UserRegistry,
};
use axum::routing::get;
use axum::Router;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub trades: Arc<TradeService>,
    pub positions: Arc<PositionService>,
    pub pnl: Arc<PnlService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub registry: Arc<UserRegistry>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/trades", get(trades::get_trades))
        .route("/v1/positions/history", get(positions::get_position_history))
        .route("/v1/pnl", get(pnl::get_pnl))
        .route("/v1/leaderboard", get(leaderboard::get_leaderboard))
        .route(
            "/v1/users",
            get(users::list_users).post(users::register_user),
        )
        .route("/v1/users/:user", axum::routing::delete(users::unregister_user))
        .with_state(state)
}

/// Parse and canonicalize a user address query/path/body parameter.
pub(crate) fn parse_user(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest("Invalid user address".to_string()))
}

/// Resolve the optional `[fromMs, toMs]` window: defaults `[0, now]`,
/// non-negative, ordered.
pub(crate) fn resolve_window(
    from_ms: Option<i64>,
    to_ms: Option<i64>,
) -> Result<(i64, i64), AppError> {
    let from_ms = from_ms.unwrap_or(0);
    let to_ms = to_ms.unwrap_or_else(now_ms);
    if from_ms < 0 || to_ms < 0 {
        return Err(AppError::BadRequest(
            "fromMs and toMs must be non-negative".to_string(),
        ));
    }
    if from_ms > to_ms {
        return Err(AppError::BadRequest("fromMs must be <= toMs".to_string()));
    }
    Ok((from_ms, to_ms))
}

/// Trim an optional coin parameter; empty means unset.
pub(crate) fn normalize_coin(coin: Option<String>) -> Option<String> {
    coin.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
