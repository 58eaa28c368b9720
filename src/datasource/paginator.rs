//! Assembles the full fill stream for a time window from batched upstream
//! queries.

use super::{DataSource, DataSourceError, BATCH_MAX};
use crate::domain::RawFill;
use std::sync::Arc;
use tracing::debug;

/// Stateful-advance paginator over [`DataSource::fetch_fills_once`].
#[derive(Debug, Clone)]
pub struct FillPaginator {
    source: Arc<dyn DataSource>,
}

impl FillPaginator {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Fetch every fill for `user` in `[from_ms, to_ms]`, optionally keeping
    /// only fills for `coin` (case-insensitive).
    ///
    /// The cursor advances past the last raw batch's final timestamp, so
    /// fills co-timestamped exactly at a batch split can be dropped; this is
    /// the accepted upstream contract. Any batch failure aborts the whole
    /// window rather than returning partial results.
    pub async fn fetch_all_fills(
        &self,
        user: &str,
        coin: Option<&str>,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<RawFill>, DataSourceError> {
        let mut cursor = from_ms;
        let mut out = Vec::new();

        loop {
            let batch = self.source.fetch_fills_once(user, cursor, to_ms).await?;
            if batch.is_empty() {
                break;
            }

            let batch_len = batch.len();
            // The advance cursor comes from the unfiltered batch.
            let last_time = batch.last().map(|f| f.time).unwrap_or(cursor);

            match coin {
                Some(c) => out.extend(batch.into_iter().filter(|f| f.coin_matches(c))),
                None => out.extend(batch),
            }

            if batch_len < BATCH_MAX {
                break;
            }
            cursor = last_time + 1;
        }

        // Stable sort keeps upstream delivery order for equal timestamps.
        out.sort_by_key(|f| f.time);

        debug!(user, from_ms, to_ms, count = out.len(), "assembled fill window");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::RawSide;

    const USER: &str = "0x0000000000000000000000000000000000000001";

    fn paginator(mock: MockDataSource) -> FillPaginator {
        FillPaginator::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_short_batch_stops_after_one_call() {
        let mock = MockDataSource::new().with_fills(
            USER,
            vec![
                RawFill::new("BTC", RawSide::B, "100", "1", 1000),
                RawFill::new("BTC", RawSide::A, "110", "1", 2000),
            ],
        );
        let counting = mock.clone();

        let fills = paginator(mock)
            .fetch_all_fills(USER, None, 0, 10_000)
            .await
            .unwrap();

        assert_eq!(fills.len(), 2);
        assert_eq!(counting.fills_calls(), 1);
    }

    #[tokio::test]
    async fn test_full_batch_triggers_followup_call() {
        // BATCH_MAX fills at distinct times, then a tail past the split.
        let mut fills: Vec<RawFill> = (0..BATCH_MAX as i64)
            .map(|i| RawFill::new("BTC", RawSide::B, "100", "1", i))
            .collect();
        fills.push(RawFill::new("BTC", RawSide::A, "110", "1", BATCH_MAX as i64 + 10));

        let mock = MockDataSource::new().with_fills(USER, fills);
        let counting = mock.clone();

        let fills = paginator(mock)
            .fetch_all_fills(USER, None, 0, i64::MAX)
            .await
            .unwrap();

        assert_eq!(fills.len(), BATCH_MAX + 1);
        assert_eq!(counting.fills_calls(), 2);
        let last = fills.last().unwrap();
        assert_eq!(last.time, BATCH_MAX as i64 + 10);
    }

    #[tokio::test]
    async fn test_empty_window_returns_empty() {
        let mock = MockDataSource::new();
        let fills = paginator(mock)
            .fetch_all_fills(USER, None, 0, 1000)
            .await
            .unwrap();
        assert!(fills.is_empty());
    }

    #[tokio::test]
    async fn test_coin_filter_is_case_insensitive() {
        let mock = MockDataSource::new().with_fills(
            USER,
            vec![
                RawFill::new("BTC", RawSide::B, "100", "1", 1000),
                RawFill::new("ETH", RawSide::B, "200", "1", 2000),
                RawFill::new("btc", RawSide::A, "110", "1", 3000),
            ],
        );

        let fills = paginator(mock)
            .fetch_all_fills(USER, Some("BTC"), 0, 10_000)
            .await
            .unwrap();

        assert_eq!(fills.len(), 2);
        assert!(fills.iter().all(|f| f.coin_matches("btc")));
    }

    #[tokio::test]
    async fn test_result_sorted_by_time() {
        let mock = MockDataSource::new().with_fills(
            USER,
            vec![
                RawFill::new("BTC", RawSide::B, "100", "1", 3000),
                RawFill::new("BTC", RawSide::B, "100", "1", 1000),
                RawFill::new("BTC", RawSide::B, "100", "1", 2000),
            ],
        );

        let fills = paginator(mock)
            .fetch_all_fills(USER, None, 0, 10_000)
            .await
            .unwrap();

        let times: Vec<i64> = fills.iter().map(|f| f.time).collect();
        assert_eq!(times, vec![1000, 2000, 3000]);
    }

    #[tokio::test]
    async fn test_batch_failure_aborts_window() {
        let mock =
            MockDataSource::new().with_failure(DataSourceError::Http { status: 502 });
        let result = paginator(mock).fetch_all_fills(USER, None, 0, 1000).await;
        assert_eq!(result.unwrap_err(), DataSourceError::Http { status: 502 });
    }
}
