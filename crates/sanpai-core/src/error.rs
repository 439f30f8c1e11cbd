//! The request-level error taxonomy for the prayer and progression engine.
//!
//! Two families matter to callers:
//!
//! - **Expected outcomes** -- bad input, a failed geofence, an exhausted
//!   quota, a refused purchase. Surfaced with a descriptive message and
//!   never retried.
//! - **Operational failures** -- broken reference data (a missing level
//!   tier), storage errors. Logged distinctly and mapped to a 500 by the
//!   API layer; nothing partial is ever committed.
//!
//! [`CoreError::from`] classifies data-layer errors into this taxonomy so
//! handlers match on exactly one enum.

use sanpai_db::DbError;
use sanpai_geo::GeoError;
use sanpai_progression::{ProgressionError, PurchaseDenied};
use sanpai_types::{AbilityId, ShrineId, UserId};

/// Errors surfaced by the orchestration layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No user exists for the given id.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No shrine exists for the given id.
    #[error("shrine not found: {0}")]
    ShrineNotFound(ShrineId),

    /// No ability definition exists for the given id.
    #[error("ability not found: {0}")]
    AbilityNotFound(AbilityId),

    /// The request carried no caller position.
    ///
    /// A physical prayer without coordinates is rejected outright; it is
    /// never treated as in-range by default.
    #[error("missing caller position")]
    MissingPosition,

    /// Malformed request input (bad id, out-of-domain coordinate).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The geofence check failed: the caller is too far from the shrine.
    #[error("out of range: {distance_meters:.1}m exceeds allowed {allowed_radius_meters}m")]
    OutOfRange {
        /// Computed great-circle distance.
        distance_meters: f64,
        /// The caller's resolved pray radius.
        allowed_radius_meters: i64,
    },

    /// The daily remote-worship quota is exhausted.
    #[error("本日の遥拝は{quota}回までです")]
    RateLimitExceeded {
        /// The user's resolved daily quota.
        quota: i64,
    },

    /// A purchase was refused by the gameplay gates.
    #[error(transparent)]
    PurchaseDenied(#[from] PurchaseDenied),

    /// An ability reset requires an active reset subscription.
    #[error("an active reset subscription is required")]
    SubscriptionRequired,

    /// Broken reference data or an impossible rule evaluation.
    ///
    /// Fatal for the request: the operation aborts with nothing
    /// committed, and the condition is logged as an operational error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(DbError),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound(id) => Self::UserNotFound(id),
            DbError::ShrineNotFound(id) => Self::ShrineNotFound(id),
            DbError::AbilityNotFound(id) => Self::AbilityNotFound(id),
            DbError::MissingLevelTier { level } => {
                Self::Configuration(format!("level tier missing for level {level}"))
            }
            DbError::Purchase(denied) => Self::PurchaseDenied(denied),
            DbError::SubscriptionRequired(_) => Self::SubscriptionRequired,
            DbError::Rules(rules) => rules.into(),
            other => Self::Storage(other),
        }
    }
}

impl From<ProgressionError> for CoreError {
    fn from(err: ProgressionError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<GeoError> for CoreError {
    fn from(err: GeoError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_not_found_maps_through() {
        let user = UserId::new();
        let mapped = CoreError::from(DbError::UserNotFound(user));
        assert!(matches!(mapped, CoreError::UserNotFound(id) if id == user));
    }

    #[test]
    fn missing_tier_becomes_configuration() {
        let mapped = CoreError::from(DbError::MissingLevelTier { level: 7 });
        assert!(matches!(mapped, CoreError::Configuration(msg) if msg.contains('7')));
    }

    #[test]
    fn purchase_denial_maps_through() {
        let mapped = CoreError::from(DbError::Purchase(PurchaseDenied::AlreadyOwned));
        assert!(matches!(
            mapped,
            CoreError::PurchaseDenied(PurchaseDenied::AlreadyOwned)
        ));
    }

    #[test]
    fn quota_message_names_the_limit() {
        let err = CoreError::RateLimitExceeded { quota: 0 };
        assert!(err.to_string().contains("0回"));
    }
}
