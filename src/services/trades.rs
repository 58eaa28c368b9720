//! Normalized trade views over the cached fill store.

use crate::cache::TtlCache;
use crate::datasource::{DataSource, DataSourceError, FillPaginator};
use crate::domain::{Address, RawFill, Trade};
use crate::engine::BuilderFilter;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Identity key used to collapse fills split across executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseKey {
    Hash,
    Oid,
    Tid,
}

impl FromStr for CollapseKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(CollapseKey::Hash),
            "oid" => Ok(CollapseKey::Oid),
            "tid" => Ok(CollapseKey::Tid),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeQuery {
    pub user: Address,
    pub coin: Option<String>,
    pub from_ms: i64,
    pub to_ms: i64,
    pub builder_only: bool,
    pub collapse_by: Option<CollapseKey>,
}

/// Read-through trade service: owns the fills cache and the paginator, and
/// is the shared raw-fill accessor for the position and PnL services.
pub struct TradeService {
    paginator: FillPaginator,
    fills_cache: TtlCache<Vec<RawFill>>,
    filter: BuilderFilter,
}

impl TradeService {
    pub fn new(source: Arc<dyn DataSource>, fills_ttl: Duration, filter: BuilderFilter) -> Self {
        Self {
            paginator: FillPaginator::new(source),
            fills_cache: TtlCache::new(fills_ttl),
            filter,
        }
    }

    /// Every fill for `(user, coin?, window)`, read through the TTL cache.
    ///
    /// The window is part of the cache key, so any shift of it is a miss by
    /// design. Coin is canonicalized to uppercase so the key and the filter
    /// agree regardless of caller spelling.
    pub async fn raw_fills(
        &self,
        user: &Address,
        coin: Option<&str>,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<RawFill>, DataSourceError> {
        let coin = coin.map(|c| c.trim().to_ascii_uppercase());
        let key = fills_cache_key(user, coin.as_deref(), from_ms, to_ms);

        let paginator = self.paginator.clone();
        let user = user.as_str().to_string();
        self.fills_cache
            .get_or_fetch(&key, move || async move {
                paginator
                    .fetch_all_fills(&user, coin.as_deref(), from_ms, to_ms)
                    .await
            })
            .await
    }

    /// Normalized, filtered, optionally collapsed trades for the window.
    pub async fn get_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, DataSourceError> {
        let fills = self
            .raw_fills(&query.user, query.coin.as_deref(), query.from_ms, query.to_ms)
            .await?;

        // The cache key is exact, but keep the window filter defensive.
        let mut fills: Vec<RawFill> = fills
            .into_iter()
            .filter(|f| f.time >= query.from_ms && f.time <= query.to_ms)
            .collect();

        if query.builder_only {
            fills = self.filter.filter_builder(&fills);
        }
        if let Some(key) = query.collapse_by {
            fills = collapse_fills(fills, key);
        }

        Ok(fills.iter().map(Trade::from_raw).collect())
    }

    /// Drop every cached window for a user.
    pub fn invalidate_user(&self, user: &Address) {
        self.fills_cache
            .invalidate_prefix(&format!("{}|", user.as_str()));
    }

    pub fn builder_filter(&self) -> &BuilderFilter {
        &self.filter
    }
}

fn fills_cache_key(user: &Address, coin: Option<&str>, from_ms: i64, to_ms: i64) -> String {
    format!(
        "{}|{}|{}|{}",
        user.as_str(),
        coin.unwrap_or("*"),
        from_ms,
        to_ms
    )
}

/// Keep the first fill per distinct key value; fills lacking the key pass
/// through unchanged.
fn collapse_fills(mut fills: Vec<RawFill>, key: CollapseKey) -> Vec<RawFill> {
    fills.sort_by_key(|f| f.time);

    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    fills
        .into_iter()
        .filter(|f| match key {
            CollapseKey::Hash => match &f.hash {
                Some(hash) => seen_hashes.insert(hash.clone()),
                None => true,
            },
            CollapseKey::Oid => match f.oid {
                Some(oid) => seen_ids.insert(oid),
                None => true,
            },
            CollapseKey::Tid => match f.tid {
                Some(tid) => seen_ids.insert(tid),
                None => true,
            },
        })
        .collect()
}
