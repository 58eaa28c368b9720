//! Domain types for the analytics gateway.
//!
//! - Primitives: Address, Side, wall-clock helpers
//! - Wire types: RawFill (with the dynamically shaped builder field),
//!   ClearinghouseState
//! - Derived views: Trade (normalized fill), PositionState

pub mod clearinghouse;
pub mod fill;
pub mod primitives;

pub use clearinghouse::{AssetPosition, ClearinghouseState, MarginSummary, PerpPosition};
pub use fill::{BuilderField, PositionState, RawFill, RawSide, Trade};
pub use primitives::{now_ms, Address, AddressParseError, Side};
