//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError, BATCH_MAX};
use crate::domain::{ClearinghouseState, MarginSummary, RawFill};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock data source seeded with per-user fills and equity.
///
/// `fetch_fills_once` behaves like the real upstream: it slices the seeded
/// stream by the requested window, orders by time, and truncates the batch
/// at [`BATCH_MAX`]. Call counters are shared across clones so tests can
/// assert how many upstream round-trips a code path produced.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    fills: HashMap<String, Vec<RawFill>>,
    equity: HashMap<String, f64>,
    fail_with: Option<DataSourceError>,
    fills_calls: Arc<AtomicUsize>,
    clearinghouse_calls: Arc<AtomicUsize>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed fills for a user (any order; serving sorts by time).
    pub fn with_fills(mut self, user: &str, fills: Vec<RawFill>) -> Self {
        self.fills
            .entry(user.to_ascii_lowercase())
            .or_default()
            .extend(fills);
        self
    }

    /// Seed current equity for a user.
    pub fn with_equity(mut self, user: &str, equity: f64) -> Self {
        self.equity.insert(user.to_ascii_lowercase(), equity);
        self
    }

    /// Make every operation fail with the given error.
    pub fn with_failure(mut self, err: DataSourceError) -> Self {
        self.fail_with = Some(err);
        self
    }

    /// Number of fills batches served so far.
    pub fn fills_calls(&self) -> usize {
        self.fills_calls.load(Ordering::SeqCst)
    }

    /// Number of clearinghouse queries served so far.
    pub fn clearinghouse_calls(&self) -> usize {
        self.clearinghouse_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_fills_once(
        &self,
        user: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<RawFill>, DataSourceError> {
        self.fills_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let mut batch: Vec<RawFill> = self
            .fills
            .get(&user.to_ascii_lowercase())
            .map(|fills| {
                fills
                    .iter()
                    .filter(|f| f.time >= start_ms && f.time <= end_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        batch.sort_by_key(|f| f.time);
        batch.truncate(BATCH_MAX);
        Ok(batch)
    }

    async fn fetch_clearinghouse(
        &self,
        user: &str,
    ) -> Result<ClearinghouseState, DataSourceError> {
        self.clearinghouse_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let equity = self
            .equity
            .get(&user.to_ascii_lowercase())
            .copied()
            .unwrap_or(0.0);

        Ok(ClearinghouseState {
            margin_summary: MarginSummary {
                account_value: equity.to_string(),
                ..Default::default()
            },
            asset_positions: Vec::new(),
        })
    }

    async fn check_health(&self) -> Result<(), DataSourceError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawSide;

    #[tokio::test]
    async fn test_mock_slices_by_window() {
        let mock = MockDataSource::new().with_fills(
            "0xAB",
            vec![
                RawFill::new("BTC", RawSide::B, "100", "1", 1000),
                RawFill::new("BTC", RawSide::A, "110", "1", 2000),
                RawFill::new("BTC", RawSide::B, "120", "1", 3000),
            ],
        );

        let batch = mock.fetch_fills_once("0xab", 1500, 2500).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].time, 2000);
        assert_eq!(mock.fills_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_truncates_at_batch_max() {
        let fills: Vec<RawFill> = (0..BATCH_MAX as i64 + 500)
            .map(|i| RawFill::new("ETH", RawSide::B, "10", "1", i))
            .collect();
        let mock = MockDataSource::new().with_fills("0xab", fills);

        let batch = mock.fetch_fills_once("0xab", 0, i64::MAX).await.unwrap();
        assert_eq!(batch.len(), BATCH_MAX);
    }

    #[tokio::test]
    async fn test_mock_equity() {
        let mock = MockDataSource::new().with_equity("0xAB", 5000.0);
        let state = mock.fetch_clearinghouse("0xab").await.unwrap();
        assert_eq!(state.account_value(), 5000.0);
    }

    #[tokio::test]
    async fn test_mock_failure_propagates() {
        let mock =
            MockDataSource::new().with_failure(DataSourceError::Http { status: 503 });
        assert!(mock.fetch_fills_once("0xab", 0, 1).await.is_err());
        assert!(mock.check_health().await.is_err());
    }
}
