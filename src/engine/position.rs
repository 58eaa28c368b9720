//! Average-cost position reconstruction.

use super::{snap_zero, BuilderFilter};
use crate::domain::{PositionState, RawFill};

/// What a fill did to the running position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEffect {
    /// Flat to non-zero: a fresh lifecycle begins.
    Opened,
    /// Same-direction size added at a new weighted average entry.
    Increased,
    /// Opposite-direction size that left the position open.
    Reduced,
    /// Position returned exactly to zero: the lifecycle ends.
    Closed,
    /// Opposite-direction size larger than the position: direction reverses
    /// and a fresh lifecycle begins at the fill price.
    Flipped,
}

/// Running average-cost position for a single coin.
///
/// Average entry price is only meaningful while the position is open; at
/// zero net size it reads 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvgCostPosition {
    net_size: f64,
    avg_entry_px: f64,
}

impl AvgCostPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn net_size(&self) -> f64 {
        self.net_size
    }

    pub fn avg_entry_px(&self) -> f64 {
        self.avg_entry_px
    }

    pub fn is_flat(&self) -> bool {
        self.net_size == 0.0
    }

    /// Apply a fill of signed size `signed_sz` (buys positive) at price `px`.
    pub fn apply_fill(&mut self, signed_sz: f64, px: f64) -> FillEffect {
        let prior = self.net_size;
        let next = snap_zero(prior + signed_sz);

        let effect = if prior == 0.0 {
            self.avg_entry_px = px;
            FillEffect::Opened
        } else if next == 0.0 {
            self.avg_entry_px = 0.0;
            FillEffect::Closed
        } else if (prior > 0.0) == (signed_sz > 0.0) {
            // Adding in the same direction: weighted-average the entry.
            let total_cost = prior.abs() * self.avg_entry_px + signed_sz.abs() * px;
            self.avg_entry_px = total_cost / next.abs();
            FillEffect::Increased
        } else if (prior > 0.0) == (next > 0.0) {
            // Partial reduce: entry price is untouched.
            FillEffect::Reduced
        } else {
            // Crossed through zero: the surviving size entered at this fill.
            self.avg_entry_px = px;
            FillEffect::Flipped
        };

        self.net_size = next;
        effect
    }
}

/// Reconstruct the position timeline for one coin.
///
/// `fills` must be the coin's fills in ascending time order. Every fill
/// drives the lifecycle builder/non-builder counters, but in builder-only
/// mode only builder-attributed fills move the position. A state is emitted
/// per counted fill at or after `from_ms`; a fill that closes the position
/// resets the counters before its state is emitted. In builder-only mode the
/// states of a lifecycle whose counters ended up mixed are dropped
/// altogether.
pub fn reconstruct_coin(
    fills: &[&RawFill],
    coin: &str,
    filter: &BuilderFilter,
    builder_only: bool,
    from_ms: i64,
) -> Vec<PositionState> {
    let mut position = AvgCostPosition::new();
    let mut has_builder = false;
    let mut has_non_builder = false;
    let mut out = Vec::new();
    let mut pending: Vec<PositionState> = Vec::new();

    for fill in fills {
        let is_builder = filter.is_builder_fill(fill);
        if is_builder {
            has_builder = true;
        } else {
            has_non_builder = true;
        }

        if builder_only && !is_builder {
            continue;
        }
        let signed_sz = fill.signed_size();
        if signed_sz == 0.0 {
            continue;
        }

        position.apply_fill(signed_sz, fill.px_f64());

        let lifecycle_tainted = has_builder && has_non_builder;
        if position.is_flat() {
            has_builder = false;
            has_non_builder = false;
        }

        if fill.time >= from_ms {
            pending.push(PositionState {
                time_ms: fill.time,
                coin: coin.to_string(),
                net_size: position.net_size(),
                avg_entry_px: position.avg_entry_px(),
                tainted: has_builder && has_non_builder,
            });
        }

        if position.is_flat() {
            if !(builder_only && lifecycle_tainted) {
                out.append(&mut pending);
            } else {
                pending.clear();
            }
        }
    }

    // Trailing unclosed lifecycle.
    if !(builder_only && has_builder && has_non_builder) {
        out.append(&mut pending);
    }

    out
}
