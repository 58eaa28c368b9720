//! Realized-PnL, volume, and capped-return computation.

use crate::cache::TtlCache;
use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{now_ms, Address, ClearinghouseState};
use crate::engine::BuilderFilter;
use crate::services::trades::TradeService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Floor for the return-percentage denominator.
pub const MIN_EFFECTIVE_CAPITAL: f64 = 0.01;
/// Symmetric cap on the reported return percentage.
pub const RETURN_PCT_CAP: f64 = 1000.0;
/// Default ceiling on effective capital when none is configured.
pub const DEFAULT_MAX_START_CAPITAL: f64 = 1_000_000.0;

#[derive(Debug, Clone)]
pub struct PnlQuery {
    pub user: Address,
    pub coin: Option<String>,
    pub from_ms: i64,
    pub to_ms: i64,
    pub builder_only: bool,
    pub max_start_capital: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResult {
    pub realized_pnl: f64,
    pub return_pct: f64,
    pub fees_paid: f64,
    pub trade_count: u64,
    pub tainted: bool,
    pub effective_capital: f64,
}

/// Aggregates realized PnL over the shared cached fill store, normalizing
/// returns against capped capital.
pub struct PnlService {
    trades: Arc<TradeService>,
    source: Arc<dyn DataSource>,
    clearinghouse_cache: TtlCache<ClearinghouseState>,
    filter: BuilderFilter,
    default_max_start_capital: f64,
}

impl PnlService {
    pub fn new(
        trades: Arc<TradeService>,
        source: Arc<dyn DataSource>,
        clearinghouse_ttl: Duration,
        filter: BuilderFilter,
        default_max_start_capital: f64,
    ) -> Self {
        Self {
            trades,
            source,
            clearinghouse_cache: TtlCache::new(clearinghouse_ttl),
            filter,
            default_max_start_capital,
        }
    }

    /// Realized PnL, fees, trade count, taint, and capped return for the
    /// window.
    pub async fn calculate_pnl(&self, query: &PnlQuery) -> Result<PnlResult, DataSourceError> {
        let fills = self
            .trades
            .raw_fills(&query.user, query.coin.as_deref(), query.from_ms, query.to_ms)
            .await?;

        let mut realized_pnl = 0.0;
        let mut fees_paid = 0.0;
        let mut trade_count: u64 = 0;
        let mut has_builder = false;
        let mut has_non_builder = false;
        let mut closed_pnl_in_window = 0.0;

        for fill in &fills {
            if fill.time < query.from_ms || fill.time > query.to_ms {
                continue;
            }

            let is_builder = self.filter.is_builder_fill(fill);
            if is_builder {
                has_builder = true;
            } else {
                has_non_builder = true;
            }
            if fill.time > query.from_ms {
                closed_pnl_in_window += fill.closed_pnl_f64();
            }

            if query.builder_only && !is_builder {
                continue;
            }
            realized_pnl += fill.closed_pnl_f64();
            fees_paid += fill.fee_f64();
            trade_count += 1;
        }

        let equity_at_start = self
            .equity_at_window_start(query, now_ms(), closed_pnl_in_window)
            .await?;
        let max_start_capital = query
            .max_start_capital
            .unwrap_or(self.default_max_start_capital);
        let effective_capital = equity_at_start
            .max(MIN_EFFECTIVE_CAPITAL)
            .min(max_start_capital);
        let return_pct =
            (100.0 * realized_pnl / effective_capital).clamp(-RETURN_PCT_CAP, RETURN_PCT_CAP);

        Ok(PnlResult {
            realized_pnl,
            return_pct,
            fees_paid,
            trade_count,
            tainted: query.builder_only && has_builder && has_non_builder,
            effective_capital,
        })
    }

    /// Notional volume (`px · sz`) over the window's counted fills.
    pub async fn calculate_volume(&self, query: &PnlQuery) -> Result<f64, DataSourceError> {
        let fills = self
            .trades
            .raw_fills(&query.user, query.coin.as_deref(), query.from_ms, query.to_ms)
            .await?;

        let mut volume = 0.0;
        for fill in &fills {
            if fill.time < query.from_ms || fill.time > query.to_ms {
                continue;
            }
            if query.builder_only && !self.filter.is_builder_fill(fill) {
                continue;
            }
            volume += fill.px_f64() * fill.sz_f64();
        }
        Ok(volume)
    }

    async fn clearinghouse(
        &self,
        user: &Address,
    ) -> Result<ClearinghouseState, DataSourceError> {
        let source = Arc::clone(&self.source);
        let user_owned = user.as_str().to_string();
        self.clearinghouse_cache
            .get_or_fetch(user.as_str(), move || async move {
                source.fetch_clearinghouse(&user_owned).await
            })
            .await
    }

    /// Approximate equity at the window start.
    ///
    /// Upstream only exposes current equity, so rewind it by every closed
    /// PnL realized in `(fromMs, now)`. The queried window only covers
    /// fills up to `toMs`; when that lies in the past, the fills between
    /// `toMs` and now also moved equity and are fetched separately.
    /// Deposits and withdrawals are not adjusted for; that imprecision is
    /// accepted.
    async fn equity_at_window_start(
        &self,
        query: &PnlQuery,
        now: i64,
        closed_pnl_in_window: f64,
    ) -> Result<f64, DataSourceError> {
        let current = self.clearinghouse(&query.user).await?.account_value();
        if query.from_ms >= now {
            return Ok(current);
        }

        let mut closed_pnl_since_start = closed_pnl_in_window;
        if query.to_ms < now {
            let tail = self
                .trades
                .raw_fills(&query.user, query.coin.as_deref(), query.to_ms + 1, now)
                .await?;
            closed_pnl_since_start += tail.iter().map(|f| f.closed_pnl_f64()).sum::<f64>();
        }

        Ok((current - closed_pnl_since_start).max(MIN_EFFECTIVE_CAPITAL))
    }

    /// Drop the cached clearinghouse snapshot for a user.
    pub fn invalidate_clearinghouse(&self, user: &Address) {
        self.clearinghouse_cache.invalidate(user.as_str());
    }
}
