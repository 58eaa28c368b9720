//! Position timeline reconstruction over the cached fill store.

use crate::datasource::DataSourceError;
use crate::domain::{Address, PositionState, RawFill};
use crate::engine::position::reconstruct_coin;
use crate::engine::BuilderFilter;
use crate::services::trades::TradeService;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PositionQuery {
    pub user: Address,
    pub coin: Option<String>,
    pub from_ms: i64,
    pub to_ms: i64,
    pub builder_only: bool,
    /// Fetch from time zero so entry prices at the window start are correct.
    pub include_prior: bool,
}

pub struct PositionService {
    trades: Arc<TradeService>,
    filter: BuilderFilter,
}

impl PositionService {
    pub fn new(trades: Arc<TradeService>, filter: BuilderFilter) -> Self {
        Self { trades, filter }
    }

    /// Reconstruct per-coin position timelines for the query window.
    pub async fn position_history(
        &self,
        query: &PositionQuery,
    ) -> Result<Vec<PositionState>, DataSourceError> {
        let fetch_from = if query.include_prior { 0 } else { query.from_ms };
        let fills = self
            .trades
            .raw_fills(&query.user, query.coin.as_deref(), fetch_from, query.to_ms)
            .await?;

        let coins = match &query.coin {
            Some(coin) => vec![coin.trim().to_ascii_uppercase()],
            None => distinct_coins(&fills),
        };

        let mut states = Vec::new();
        for coin in &coins {
            let coin_fills: Vec<&RawFill> =
                fills.iter().filter(|f| f.coin_matches(coin)).collect();
            states.extend(reconstruct_coin(
                &coin_fills,
                coin,
                &self.filter,
                query.builder_only,
                query.from_ms,
            ));
        }

        // Stable sort keeps per-coin order for co-timestamped states.
        states.sort_by_key(|s| s.time_ms);
        Ok(states)
    }
}

/// Distinct coins in order of first appearance.
fn distinct_coins(fills: &[RawFill]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut coins = Vec::new();
    for fill in fills {
        let canonical = fill.coin.to_ascii_uppercase();
        if seen.insert(canonical.clone()) {
            coins.push(canonical);
        }
    }
    coins
}
