//! Error types for the `sanpai-progression` crate.
//!
//! [`ProgressionError`] covers arithmetic failures and broken reference
//! data. Expected gameplay rejections (already owned, not enough points)
//! are *not* errors of this kind -- see
//! [`PurchaseDenied`](crate::abilities::PurchaseDenied).

use sanpai_types::AbilityId;

/// Errors that can occur while evaluating progression rules.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    /// An arithmetic overflow occurred during a rule computation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// Experience grants must be non-negative; exp never decreases.
    #[error("negative experience grant: {amount}")]
    NegativeGrant {
        /// The rejected amount.
        amount: i64,
    },

    /// The level tier table has no row for a level a live user holds.
    ///
    /// Fatal reference-data problem: the tier table must be contiguous
    /// from level 0 upward.
    #[error("level tier missing for level {level}")]
    MissingLevelTier {
        /// The level with no tier row.
        level: i64,
    },

    /// An ability names a prerequisite that does not exist.
    #[error("ability {ability} references unknown prerequisite {prerequisite}")]
    UnknownPrerequisite {
        /// The ability with the dangling reference.
        ability: AbilityId,
        /// The missing prerequisite id.
        prerequisite: AbilityId,
    },

    /// The prerequisite graph contains a cycle.
    ///
    /// Seed data must form a DAG; a cycle makes some abilities forever
    /// unpurchasable.
    #[error("prerequisite cycle detected through ability {ability}")]
    PrerequisiteCycle {
        /// An ability on the cycle.
        ability: AbilityId,
    },
}
