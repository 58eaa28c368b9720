//! Derived-view services over the cached fill store.
//!
//! Construction is leaves-first: trades owns the fill cache, positions and
//! pnl read through it, leaderboard fans out over pnl and the registry.

pub mod leaderboard;
pub mod pnl;
pub mod positions;
pub mod registry;
pub mod trades;

pub use leaderboard::{
    Leaderboard, LeaderboardEntry, LeaderboardMetric, LeaderboardQuery, LeaderboardService,
};
pub use pnl::{PnlQuery, PnlResult, PnlService};
pub use positions::{PositionQuery, PositionService};
pub use registry::UserRegistry;
pub use trades::{CollapseKey, TradeQuery, TradeService};
