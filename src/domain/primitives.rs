//! Domain primitives: wall-clock time, addresses, trade sides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// The gateway carries timestamps as raw `i64` ms, matching the upstream
/// wire format.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Wallet address, canonicalized to lowercase at parse time.
///
/// Upstream compares addresses case-insensitively, so a single lowercase
/// form is stored and every comparison in the gateway is plain equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The input did not look like `0x` followed by 40 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParseError;

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected a 0x-prefixed 40-digit hex address")
    }
}

impl std::error::Error for AddressParseError {}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix("0x").ok_or(AddressParseError)?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError);
        }
        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

/// Trade side: buy (long) or sell (short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed size multiplier: buys add to a position, sells remove.
    pub fn sign(&self) -> f64 {
        if matches!(self, Side::Buy) {
            1.0
        } else {
            -1.0
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
