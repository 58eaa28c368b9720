//! Pure in-memory derivation logic: builder attribution and position
//! reconstruction.

pub mod builder;
pub mod position;

pub use builder::BuilderFilter;
pub use position::{AvgCostPosition, FillEffect};

/// Float net sizes this close to zero count as flat.
pub(crate) const SIZE_EPSILON: f64 = 1e-9;

/// Collapse float residue at lifecycle boundaries to an exact zero.
pub(crate) fn snap_zero(size: f64) -> f64 {
    if size.abs() < SIZE_EPSILON {
        0.0
    } else {
        size
    }
}
