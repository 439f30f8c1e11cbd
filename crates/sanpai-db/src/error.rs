//! Error types for the data layer.
//!
//! [`DbError`] covers both infrastructure failures (connection, migration,
//! SQL) and the domain outcomes the transactional stores decide *inside*
//! their transactions (missing rows, refused purchases). The orchestration
//! layer classifies these into the API-facing taxonomy; the split matters
//! there because a refused purchase is an expected outcome while a missing
//! level tier is an operational emergency.

use sanpai_progression::{ProgressionError, PurchaseDenied};
use sanpai_types::{AbilityId, ShrineId, UserId};

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No user row exists for the given id.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No shrine row exists for the given id.
    #[error("shrine not found: {0}")]
    ShrineNotFound(ShrineId),

    /// No ability definition exists for the given id.
    #[error("ability not found: {0}")]
    AbilityNotFound(AbilityId),

    /// The level tier table has no row for a level a live user holds.
    ///
    /// Fatal reference-data problem; the enclosing operation is aborted
    /// and nothing is committed.
    #[error("level tier missing for level {level}")]
    MissingLevelTier {
        /// The level with no tier row.
        level: i64,
    },

    /// A purchase was refused by the gameplay gates.
    #[error("purchase denied: {0}")]
    Purchase(#[from] PurchaseDenied),

    /// An ability reset requires an active `reset_abilities` subscription.
    #[error("no active reset subscription for user {0}")]
    SubscriptionRequired(UserId),

    /// A pure rule evaluation failed (overflow, broken reference data).
    #[error("rule evaluation failed: {0}")]
    Rules(#[from] ProgressionError),
}

impl DbError {
    /// Whether an underlying sqlx error is a unique-constraint violation.
    ///
    /// Used to translate the `user_abilities` uniqueness backstop into
    /// [`PurchaseDenied::AlreadyOwned`] when two purchases race.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Database(db) if db.is_unique_violation()
        )
    }
}
