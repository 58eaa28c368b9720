//! Data source abstraction over the upstream exchange `/info` API.

use crate::domain::{ClearinghouseState, RawFill};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod hyperliquid;
pub mod mock;
pub mod paginator;
pub mod rate_limit;

pub use hyperliquid::HyperliquidDataSource;
pub use mock::MockDataSource;
pub use paginator::FillPaginator;
pub use rate_limit::RateLimiter;

/// Largest batch the upstream returns for a single fills query.
pub const BATCH_MAX: usize = 2000;

/// Request weight of a fills query.
pub const WEIGHT_FILLS: u32 = 20;
/// Request weight of a clearinghouse query.
pub const WEIGHT_CLEARINGHOUSE: u32 = 2;
/// Request weight of a meta (health) query.
pub const WEIGHT_META: u32 = 1;

/// Typed view of the two upstream operations the gateway consumes, plus a
/// health probe.
///
/// Implementations acquire their request weight from the shared rate limiter
/// before issuing a call, and do not retry: transport and decode failures
/// surface as [`DataSourceError`].
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch a single batch of fills for a user within `[start_ms, end_ms]`,
    /// ordered by time ascending, at most [`BATCH_MAX`] entries.
    async fn fetch_fills_once(
        &self,
        user: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<RawFill>, DataSourceError>;

    /// Fetch the user's current clearinghouse state (equity and open
    /// positions).
    async fn fetch_clearinghouse(&self, user: &str)
        -> Result<ClearinghouseState, DataSourceError>;

    /// Probe upstream health; any successful response counts.
    async fn check_health(&self) -> Result<(), DataSourceError>;

    /// Short identifier reported on `/health`.
    fn name(&self) -> &'static str;
}

/// Error type for upstream operations.
///
/// Clone so that single-flight followers can observe the leader's failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    /// Connection-level failure (timeout, DNS, refused).
    #[error("network error: {0}")]
    Network(String),
    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Http { status: u16 },
    /// Response body was not the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),
}
