//! Pure gameplay rules for the Sanpai progression engine.
//!
//! Everything in this crate is a deterministic function of its arguments:
//! no store access, no clocks. The data layer re-evaluates these rules
//! inside its transactions so the decision and the write happen under the
//! same row lock.
//!
//! # Modules
//!
//! - [`leveling`] -- Experience grants and single-step level advancement
//! - [`effects`] -- Derived pray distance and daily worship quota
//! - [`abilities`] -- Purchase gates, refund totals, prerequisite DAG checks
//! - [`error`] -- Rule-evaluation errors (overflow, broken reference data)

pub mod abilities;
pub mod effects;
pub mod error;
pub mod leveling;

// Re-export primary items at crate root.
pub use abilities::{PurchaseDenied, check_purchase, refund_total, validate_prerequisites};
pub use effects::{
    RANGE_SUBSCRIPTION_MULTIPLIER, WORSHIP_SUBSCRIPTION_BONUS, pray_distance_meters, worship_quota,
};
pub use error::ProgressionError;
pub use leveling::{
    GrantOutcome, LevelProgress, POINTS_PER_LEVEL_UP, apply_experience, progress_within_level,
};
