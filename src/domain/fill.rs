//! Raw upstream fills and their normalized form.

use crate::domain::Side;
use serde::{Deserialize, Serialize};

/// Parse an upstream decimal string as a double.
///
/// Upstream numeric fields are decimal strings; a malformed or empty string
/// reads as 0, matching the lenient parse the upstream contract tolerates.
pub(crate) fn parse_decimal(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// Upstream side code: `B` (bid/buy) or `A` (ask/sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSide {
    B,
    A,
}

impl RawSide {
    /// Map the wire code to the normalized side: `B` → buy, `A` → sell.
    pub fn to_side(self) -> Side {
        match self {
            RawSide::B => Side::Buy,
            RawSide::A => Side::Sell,
        }
    }
}

/// The upstream `builder` field, which arrives in one of two shapes:
/// a bare address string, or an object `{b: address, f: fee-tenths-bps}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuilderField {
    /// Object form: `{"b": "0x...", "f": 10}`.
    Tagged {
        b: String,
        #[serde(default)]
        f: f64,
    },
    /// Bare address string form.
    Address(String),
}

impl BuilderField {
    /// The builder address carried by either shape.
    pub fn address(&self) -> &str {
        match self {
            BuilderField::Tagged { b, .. } => b,
            BuilderField::Address(addr) => addr,
        }
    }
}

/// A single fill as returned by the upstream exchange.
///
/// Numeric fields are decimal strings on the wire; accessor methods parse
/// them to doubles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFill {
    pub coin: String,
    pub px: String,
    pub sz: String,
    pub side: RawSide,
    pub time: i64,
    #[serde(default)]
    pub closed_pnl: String,
    #[serde(default)]
    pub fee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<i64>,
}

impl RawFill {
    /// Create a fill with the required fields; optional wire fields start
    /// absent and can be layered on with the `with_*` builders.
    pub fn new(coin: &str, side: RawSide, px: &str, sz: &str, time: i64) -> Self {
        RawFill {
            coin: coin.to_string(),
            px: px.to_string(),
            sz: sz.to_string(),
            side,
            time,
            closed_pnl: "0".to_string(),
            fee: "0".to_string(),
            builder: None,
            builder_fee: None,
            hash: None,
            oid: None,
            tid: None,
        }
    }

    pub fn with_fee(mut self, fee: &str) -> Self {
        self.fee = fee.to_string();
        self
    }

    pub fn with_closed_pnl(mut self, closed_pnl: &str) -> Self {
        self.closed_pnl = closed_pnl.to_string();
        self
    }

    pub fn with_builder(mut self, builder: BuilderField) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn with_builder_fee(mut self, builder_fee: &str) -> Self {
        self.builder_fee = Some(builder_fee.to_string());
        self
    }

    pub fn with_hash(mut self, hash: &str) -> Self {
        self.hash = Some(hash.to_string());
        self
    }

    pub fn with_oid(mut self, oid: i64) -> Self {
        self.oid = Some(oid);
        self
    }

    pub fn with_tid(mut self, tid: i64) -> Self {
        self.tid = Some(tid);
        self
    }

    pub fn px_f64(&self) -> f64 {
        parse_decimal(&self.px)
    }

    pub fn sz_f64(&self) -> f64 {
        parse_decimal(&self.sz)
    }

    pub fn fee_f64(&self) -> f64 {
        parse_decimal(&self.fee)
    }

    pub fn closed_pnl_f64(&self) -> f64 {
        parse_decimal(&self.closed_pnl)
    }

    /// Builder fee as a double; 0 when absent or malformed.
    pub fn builder_fee_f64(&self) -> f64 {
        self.builder_fee.as_deref().map(parse_decimal).unwrap_or(0.0)
    }

    /// The upstream-reported builder address, if any.
    pub fn builder_address(&self) -> Option<&str> {
        self.builder.as_ref().map(|b| b.address())
    }

    /// Size signed by side: buys positive, sells negative.
    pub fn signed_size(&self) -> f64 {
        self.side.to_side().sign() * self.sz_f64()
    }

    /// Case-insensitive coin match.
    pub fn coin_matches(&self, coin: &str) -> bool {
        self.coin.eq_ignore_ascii_case(coin)
    }
}

/// A normalized fill as exposed on `/v1/trades`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub time_ms: i64,
    pub coin: String,
    pub side: Side,
    pub px: f64,
    pub sz: f64,
    pub fee: f64,
    pub closed_pnl: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
}

impl Trade {
    /// Normalize a raw fill.
    ///
    /// The `builder` string is the upstream-reported address (lowercased)
    /// when present, else the literal `"builder"` when the fill paid a
    /// builder fee, else absent.
    pub fn from_raw(fill: &RawFill) -> Self {
        let builder = match fill.builder_address() {
            Some(addr) => Some(addr.to_ascii_lowercase()),
            None if fill.builder_fee_f64() > 0.0 => Some("builder".to_string()),
            None => None,
        };

        Trade {
            time_ms: fill.time,
            coin: fill.coin.clone(),
            side: fill.side.to_side(),
            px: fill.px_f64(),
            sz: fill.sz_f64(),
            fee: fill.fee_f64(),
            closed_pnl: fill.closed_pnl_f64(),
            builder,
        }
    }
}

/// One reconstructed position state per counted fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub time_ms: i64,
    pub coin: String,
    pub net_size: f64,
    pub avg_entry_px: f64,
    pub tainted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fill() -> RawFill {
        RawFill {
            coin: "BTC".to_string(),
            px: "50000".to_string(),
            sz: "1.5".to_string(),
            side: RawSide::B,
            time: 1000,
            closed_pnl: "0".to_string(),
            fee: "10".to_string(),
            builder: None,
            builder_fee: None,
            hash: Some("0xabc".to_string()),
            oid: Some(456),
            tid: Some(123),
        }
    }

    #[test]
    fn test_side_mapping() {
        assert_eq!(RawSide::B.to_side(), Side::Buy);
        assert_eq!(RawSide::A.to_side(), Side::Sell);
    }

    #[test]
    fn test_builder_field_string_form() {
        let json = r#"{"coin":"BTC","px":"1","sz":"1","side":"B","time":1,
                       "closedPnl":"0","fee":"0","builder":"0xAbC"}"#;
        let fill: RawFill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.builder_address(), Some("0xAbC"));
    }

    #[test]
    fn test_builder_field_object_form() {
        let json = r#"{"coin":"BTC","px":"1","sz":"1","side":"B","time":1,
                       "closedPnl":"0","fee":"0","builder":{"b":"0xdef","f":25}}"#;
        let fill: RawFill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.builder_address(), Some("0xdef"));
    }

    #[test]
    fn test_builder_field_absent() {
        let json = r#"{"coin":"BTC","px":"1","sz":"1","side":"A","time":1,
                       "closedPnl":"0","fee":"0"}"#;
        let fill: RawFill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.builder_address(), None);
    }

    #[test]
    fn test_decimal_accessors() {
        let fill = base_fill();
        assert_eq!(fill.px_f64(), 50000.0);
        assert_eq!(fill.sz_f64(), 1.5);
        assert_eq!(fill.fee_f64(), 10.0);
        assert_eq!(fill.signed_size(), 1.5);
    }

    #[test]
    fn test_malformed_decimal_reads_as_zero() {
        let mut fill = base_fill();
        fill.px = "garbage".to_string();
        assert_eq!(fill.px_f64(), 0.0);
    }

    #[test]
    fn test_normalize_maps_sides_and_numbers() {
        let mut fill = base_fill();
        fill.side = RawSide::A;
        fill.closed_pnl = "12.5".to_string();
        let trade = Trade::from_raw(&fill);
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.px, 50000.0);
        assert_eq!(trade.closed_pnl, 12.5);
        assert_eq!(trade.builder, None);
    }

    #[test]
    fn test_normalize_builder_address_lowercased() {
        let mut fill = base_fill();
        fill.builder = Some(BuilderField::Address("0xAABB".to_string()));
        let trade = Trade::from_raw(&fill);
        assert_eq!(trade.builder.as_deref(), Some("0xaabb"));
    }

    #[test]
    fn test_normalize_builder_fee_literal() {
        let mut fill = base_fill();
        fill.builder_fee = Some("0.5".to_string());
        let trade = Trade::from_raw(&fill);
        assert_eq!(trade.builder.as_deref(), Some("builder"));
    }

    #[test]
    fn test_coin_matches_is_case_insensitive() {
        let fill = base_fill();
        assert!(fill.coin_matches("btc"));
        assert!(!fill.coin_matches("ETH"));
    }
}
