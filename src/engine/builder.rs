//! Builder attribution: per-fill classification, lifecycle grouping, taint.

use super::snap_zero;
use crate::domain::RawFill;

/// Classifies fills against a single configured target builder.
///
/// With no target configured nothing is builder-attributed and no taint
/// ever fires.
#[derive(Debug, Clone, Default)]
pub struct BuilderFilter {
    target: Option<String>,
}

impl BuilderFilter {
    pub fn new(target: Option<&str>) -> Self {
        Self {
            target: target.map(|t| t.to_ascii_lowercase()),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The upstream-reported builder address of a fill, if any.
    pub fn builder_of<'a>(&self, fill: &'a RawFill) -> Option<&'a str> {
        fill.builder_address()
    }

    /// A fill is builder-attributed when a target is configured and either
    /// the reported builder address matches it, or no address is reported
    /// but the fill paid a builder fee.
    pub fn is_builder_fill(&self, fill: &RawFill) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        match fill.builder_address() {
            Some(addr) => addr.eq_ignore_ascii_case(target),
            None => fill.builder_fee_f64() > 0.0,
        }
    }

    /// Keep only builder-attributed fills; empty when no target is set.
    pub fn filter_builder(&self, fills: &[RawFill]) -> Vec<RawFill> {
        if self.target.is_none() {
            return Vec::new();
        }
        fills
            .iter()
            .filter(|f| self.is_builder_fill(f))
            .cloned()
            .collect()
    }

    /// A fill set is tainted when it mixes builder and non-builder fills.
    pub fn detect_taint<'a, I>(&self, fills: I) -> bool
    where
        I: IntoIterator<Item = &'a RawFill>,
    {
        let mut has_builder = false;
        let mut has_non_builder = false;
        for fill in fills {
            if self.is_builder_fill(fill) {
                has_builder = true;
            } else {
                has_non_builder = true;
            }
            if has_builder && has_non_builder {
                return true;
            }
        }
        false
    }

    /// Group a coin's fills into position lifecycles.
    ///
    /// Fills for other coins are ignored; the rest are walked in time order
    /// with a signed running size. A lifecycle opens when the size leaves
    /// zero and closes when it returns; a trailing unclosed lifecycle is
    /// still emitted.
    pub fn group_by_lifecycle<'a>(
        &self,
        fills: &'a [RawFill],
        coin: &str,
    ) -> Vec<Vec<&'a RawFill>> {
        let mut coin_fills: Vec<&RawFill> =
            fills.iter().filter(|f| f.coin_matches(coin)).collect();
        coin_fills.sort_by_key(|f| f.time);

        let mut lifecycles = Vec::new();
        let mut current: Vec<&RawFill> = Vec::new();
        let mut net_size = 0.0;

        for fill in coin_fills {
            net_size = snap_zero(net_size + fill.signed_size());
            current.push(fill);
            if net_size == 0.0 {
                lifecycles.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            lifecycles.push(current);
        }
        lifecycles
    }

    /// True when any of the coin's lifecycles is tainted.
    pub fn any_lifecycle_tainted(&self, fills: &[RawFill], coin: &str) -> bool {
        self.group_by_lifecycle(fills, coin)
            .iter()
            .any(|lifecycle| self.detect_taint(lifecycle.iter().copied()))
    }
}
