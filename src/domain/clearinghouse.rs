//! Clearinghouse state as returned by the upstream `clearinghouseState` query.

use crate::domain::fill::parse_decimal;
use serde::{Deserialize, Serialize};

/// Current account snapshot: equity plus open per-coin positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearinghouseState {
    #[serde(default)]
    pub margin_summary: MarginSummary,
    #[serde(default)]
    pub asset_positions: Vec<AssetPosition>,
}

impl ClearinghouseState {
    /// Current account equity as a double.
    pub fn account_value(&self) -> f64 {
        parse_decimal(&self.margin_summary.account_value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginSummary {
    #[serde(default)]
    pub account_value: String,
    #[serde(default)]
    pub total_ntl_pos: String,
    #[serde(default)]
    pub total_margin_used: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPosition {
    #[serde(default)]
    pub position: PerpPosition,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpPosition {
    #[serde(default)]
    pub coin: String,
    /// Signed position size, decimal string.
    #[serde(default)]
    pub szi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_px: Option<String>,
}
