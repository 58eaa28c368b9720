//! Ranked leaderboard over the registered user set.

use crate::domain::now_ms;
use crate::services::pnl::{PnlQuery, PnlService};
use crate::services::registry::UserRegistry;
use futures::future::join_all;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

/// Ranking metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardMetric {
    Volume,
    Pnl,
    ReturnPct,
}

impl FromStr for LeaderboardMetric {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volume" => Ok(LeaderboardMetric::Volume),
            "pnl" => Ok(LeaderboardMetric::Pnl),
            "returnpct" => Ok(LeaderboardMetric::ReturnPct),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeaderboardQuery {
    pub metric: LeaderboardMetric,
    pub coin: Option<String>,
    pub from_ms: i64,
    pub to_ms: i64,
    pub builder_only: bool,
    pub max_start_capital: Option<f64>,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user: String,
    pub metric_value: f64,
    pub trade_count: u64,
    pub tainted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub generated_at: i64,
}

/// Fans PnL computation out over the registry and ranks the results.
pub struct LeaderboardService {
    pnl: Arc<PnlService>,
    registry: Arc<UserRegistry>,
}

impl LeaderboardService {
    pub fn new(pnl: Arc<PnlService>, registry: Arc<UserRegistry>) -> Self {
        Self { pnl, registry }
    }

    /// Compute the ranked board.
    ///
    /// Per-user failures are logged and the user is skipped; in builder-only
    /// mode tainted users are excluded. Ties keep the registry snapshot's
    /// order.
    pub async fn get_leaderboard(&self, query: &LeaderboardQuery) -> Leaderboard {
        let users = self.registry.list();

        let rows = join_all(users.into_iter().map(|user| {
            let pnl_query = PnlQuery {
                user: user.clone(),
                coin: query.coin.clone(),
                from_ms: query.from_ms,
                to_ms: query.to_ms,
                builder_only: query.builder_only,
                max_start_capital: query.max_start_capital,
            };
            async move {
                let pnl = match self.pnl.calculate_pnl(&pnl_query).await {
                    Ok(pnl) => pnl,
                    Err(err) => {
                        warn!(user = %user, error = %err, "leaderboard pnl failed; skipping user");
                        return None;
                    }
                };
                if query.builder_only && pnl.tainted {
                    return None;
                }

                let metric_value = match query.metric {
                    LeaderboardMetric::Pnl => pnl.realized_pnl,
                    LeaderboardMetric::ReturnPct => pnl.return_pct,
                    LeaderboardMetric::Volume => {
                        match self.pnl.calculate_volume(&pnl_query).await {
                            Ok(volume) => volume,
                            Err(err) => {
                                warn!(user = %user, error = %err, "leaderboard volume failed; skipping user");
                                return None;
                            }
                        }
                    }
                };

                Some((user, metric_value, pnl.trade_count, pnl.tainted))
            }
        }))
        .await;

        let mut rows: Vec<_> = rows.into_iter().flatten().collect();
        // Stable sort: equal metrics keep registry order.
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows.truncate(query.limit.min(MAX_LIMIT));

        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (user, metric_value, trade_count, tainted))| LeaderboardEntry {
                rank: idx + 1,
                user: user.as_str().to_string(),
                metric_value,
                trade_count,
                tainted,
            })
            .collect();

        Leaderboard {
            entries,
            generated_at: now_ms(),
        }
    }
}
