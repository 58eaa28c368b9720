//! Hyperliquid client over the public Info API.

use super::{
    DataSource, DataSourceError, RateLimiter, WEIGHT_CLEARINGHOUSE, WEIGHT_FILLS, WEIGHT_META,
};
use crate::domain::{ClearinghouseState, RawFill};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

/// Data source backed by Hyperliquid's `/info` endpoint.
///
/// Every call acquires its weight from the shared limiter before touching
/// the network. No retries: backoff is entirely the limiter's concern, and
/// idempotent GET callers may retry at their own layer.
#[derive(Debug, Clone)]
pub struct HyperliquidDataSource {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl HyperliquidDataSource {
    pub fn new(base_url: String, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            limiter,
        }
    }

    async fn post_info(
        &self,
        weight: u32,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        self.limiter.acquire(weight).await;

        let url = format!("{}/info", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DataSourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Http {
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DataSourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataSource for HyperliquidDataSource {
    async fn fetch_fills_once(
        &self,
        user: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<RawFill>, DataSourceError> {
        debug!(user, start_ms, end_ms, "fetching fills batch");

        let payload = serde_json::json!({
            "type": "userFillsByTime",
            "user": user,
            "startTime": start_ms,
            "endTime": end_ms,
            "aggregateByTime": true,
        });

        let response = self.post_info(WEIGHT_FILLS, payload).await?;
        serde_json::from_value(response).map_err(|e| DataSourceError::Decode(e.to_string()))
    }

    async fn fetch_clearinghouse(
        &self,
        user: &str,
    ) -> Result<ClearinghouseState, DataSourceError> {
        debug!(user, "fetching clearinghouse state");

        let payload = serde_json::json!({
            "type": "clearinghouseState",
            "user": user,
        });

        let response = self.post_info(WEIGHT_CLEARINGHOUSE, payload).await?;
        serde_json::from_value(response).map_err(|e| DataSourceError::Decode(e.to_string()))
    }

    async fn check_health(&self) -> Result<(), DataSourceError> {
        let payload = serde_json::json!({"type": "meta"});
        self.post_info(WEIGHT_META, payload).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "hyperliquid"
    }
}
