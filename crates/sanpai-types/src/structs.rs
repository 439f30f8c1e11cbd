//! Core entity structs persisted by the data layer.
//!
//! These mirror the PostgreSQL schema one-to-one. Gameplay quantities
//! (level, experience, ability points, costs) are `i64` to match the
//! `BIGINT` columns they live in; non-negativity is enforced by CHECK
//! constraints in the schema and by checked arithmetic in the rules layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EffectType, SubscriptionType};
use crate::ids::{
    AbilityId, DeityId, LedgerEntryId, RemotePrayerEventId, ShrineId, SubscriptionId, UserId,
};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 180].
    pub lng: f64,
}

impl Position {
    /// Create a position from degree coordinates.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ---------------------------------------------------------------------------
// Users and progression
// ---------------------------------------------------------------------------

/// A registered user and their progression state.
///
/// `exp` is monotonically non-decreasing. Only the progression engine
/// mutates `level`/`exp`/`ability_points` (plus the ability tree for
/// points spent and refunded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Current level (>= 0).
    pub level: i64,
    /// Accumulated experience (>= 0).
    pub exp: i64,
    /// Unspent ability points (never negative).
    pub ability_points: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// One row of the static level reference table.
///
/// Tiers must exist contiguously from level 0 upward; a gap under a live
/// user level is a configuration error, not a defaultable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LevelTier {
    /// The level this row describes.
    pub level: i64,
    /// Total experience required to hold this level.
    pub required_exp: i64,
    /// Base physical pray radius in meters at this level.
    pub pray_distance: i64,
    /// Base daily remote-worship quota at this level.
    pub worship_count: i64,
}

// ---------------------------------------------------------------------------
// Shrines and deities
// ---------------------------------------------------------------------------

/// A shrine with a fixed geographic position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Shrine {
    /// Shrine identifier.
    pub id: ShrineId,
    /// Shrine name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Shrine {
    /// The shrine's coordinates as a [`Position`].
    pub const fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// A deity that can be enshrined at any number of shrines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Deity {
    /// Deity identifier.
    pub id: DeityId,
    /// Deity name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

/// Reference data describing one purchasable ability.
///
/// `prerequisite_ability_id` forms a DAG (a tree in practice); cycles are
/// an invariant violation never to be introduced by seed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AbilityDefinition {
    /// Ability identifier.
    pub id: AbilityId,
    /// Ability name.
    pub name: String,
    /// Purchase cost in ability points.
    pub cost: i64,
    /// Which derived stat this ability modifies.
    pub effect_type: EffectType,
    /// Flat contribution to the matching derived stat.
    pub effect_value: i64,
    /// Ability that must be owned before this one can be purchased.
    pub prerequisite_ability_id: Option<AbilityId>,
}

/// Ownership record: the user currently holds this ability's effect.
///
/// Exists iff the purchase has not been reset since. The
/// `(user_id, ability_id)` pair is unique in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserAbility {
    /// Owning user.
    pub user_id: UserId,
    /// Owned ability.
    pub ability_id: AbilityId,
    /// When the purchase happened.
    pub acquired_at: DateTime<Utc>,
}

/// Append-only audit record of ability-point movement.
///
/// Positive `points_spent` on purchase; negative on refund. Never mutated
/// or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AbilityLedgerEntry {
    /// Ledger row identifier.
    pub id: LedgerEntryId,
    /// User whose points moved.
    pub user_id: UserId,
    /// Ability involved.
    pub ability_id: AbilityId,
    /// Signed point movement (+cost on purchase, negative on refund).
    pub points_spent: i64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// A time-bounded purchased effect.
///
/// Expiry is lazy: no background sweep flips `is_active`, so consumers
/// must treat a row with `expires_at <= now` as inactive regardless of
/// the flag. Use [`Subscription::is_live`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Subscription {
    /// Subscription row identifier.
    pub id: SubscriptionId,
    /// Subscribed user.
    pub user_id: UserId,
    /// Which effect this subscription grants.
    pub subscription_type: SubscriptionType,
    /// Active flag; cleared when consumed or cancelled.
    pub is_active: bool,
    /// Start of the current billing window.
    pub started_at: DateTime<Utc>,
    /// End of the current billing window.
    pub expires_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription is in effect at `now`.
    ///
    /// Both the `is_active` flag and the expiry must agree.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

// ---------------------------------------------------------------------------
// Prayer statistics and remote events
// ---------------------------------------------------------------------------

/// One aggregate counter row from any of the eight prayer stat tables.
///
/// `rank` is a placeholder recomputed by an external ranking job; this
/// service only ever writes its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PrayerStat {
    /// Target (shrine or deity) the counter belongs to.
    pub target_id: uuid::Uuid,
    /// Praying user.
    pub user_id: UserId,
    /// Number of prayers recorded in this bucket (>= 1).
    pub count: i64,
    /// Placeholder rank owned by the external ranking job.
    pub rank: i64,
}

/// Append-only record of one remote prayer.
///
/// The quota tracker counts these within the server-local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RemotePrayerEvent {
    /// Event identifier.
    pub id: RemotePrayerEventId,
    /// Shrine prayed to.
    pub shrine_id: ShrineId,
    /// Praying user.
    pub user_id: UserId,
    /// When the remote prayer happened.
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn subscription_live_requires_flag_and_future_expiry() {
        let now = Utc::now();
        let base = Subscription {
            id: SubscriptionId::new(),
            user_id: UserId::new(),
            subscription_type: SubscriptionType::RangeMultiplier,
            is_active: true,
            started_at: now - TimeDelta::days(1),
            expires_at: now + TimeDelta::days(29),
        };
        assert!(base.is_live(now));

        let expired = Subscription {
            expires_at: now - TimeDelta::seconds(1),
            ..base.clone()
        };
        assert!(!expired.is_live(now), "lazy expiry must win over is_active");

        let inactive = Subscription {
            is_active: false,
            ..base
        };
        assert!(!inactive.is_live(now));
    }

    #[test]
    fn shrine_position_projection() {
        let shrine = Shrine {
            id: ShrineId::new(),
            name: String::from("Kanda Myojin"),
            latitude: 35.702,
            longitude: 139.768,
            created_at: Utc::now(),
        };
        let pos = shrine.position();
        assert!((pos.lat - 35.702).abs() < f64::EPSILON);
        assert!((pos.lng - 139.768).abs() < f64::EPSILON);
    }
}
