//! Pure accounting engine.
//!
//! Everything under `ledger` operates on deserialized account structs only, so
//! the activation, credit, reward and lifecycle rules are shared between the
//! instruction handlers and the unit tests. No routine here writes before all of
//! its checks have passed.

pub mod activation;
pub mod checkpoints;
pub mod credits;
pub mod fixed_point;
pub mod lifecycle;
pub mod rewards;

pub use checkpoints::*;
pub use fixed_point::*;
pub use lifecycle::Phase;
pub use rewards::RewardStream;

/// Denominator for basis-point fee rates.
pub const FEE_RATE_DENOMINATOR_VALUE: u64 = 10_000;

/// Upper bound accepted for `GlobalConfig::fee_rate` (20%).
pub const MAX_FEE_RATE: u64 = 2_000;
