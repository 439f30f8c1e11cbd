//! Enumeration types shared across the Sanpai workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Ability effects
// ---------------------------------------------------------------------------

/// What an ability modifies once owned.
///
/// Ownership is binary: an owned ability contributes its flat
/// `effect_value` to the matching derived stat; there is no per-ability
/// leveling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EffectType {
    /// Extends the allowed physical pray radius (meters).
    Range,
    /// Raises the daily remote-worship quota (count).
    Worship,
    /// Cosmetic or externally-interpreted effect; ignored by the resolver.
    Other,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// A purchasable, time-bounded subscription effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SubscriptionType {
    /// Doubles the resolved pray distance while active.
    RangeMultiplier,
    /// Adds one to the resolved daily worship quota while active.
    WorshipBoost,
    /// Unlocks a single ability-tree reset; consumed by the reset.
    ResetAbilities,
}

// ---------------------------------------------------------------------------
// Prayer statistics
// ---------------------------------------------------------------------------

/// The kind of target a prayer statistic row is attached to.
///
/// A physical prayer increments shrine-directed counters and, for every
/// deity enshrined at that shrine, deity-directed counters as well.
/// Remote prayers increment shrine-directed counters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PrayerTarget {
    /// Counter keyed by shrine.
    Shrine,
    /// Counter keyed by deity.
    Deity,
}

/// One of the four parallel aggregation windows kept per prayer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StatPeriod {
    /// Counts since the beginning of time.
    AllTime,
    /// Counts within a calendar year.
    Yearly,
    /// Counts within a calendar month.
    Monthly,
    /// Counts within an ISO week.
    Weekly,
}

impl StatPeriod {
    /// All four periods, in the order the fan-out applies them.
    pub const ALL: [Self; 4] = [Self::AllTime, Self::Yearly, Self::Monthly, Self::Weekly];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_type_serializes_snake_case() {
        let json = serde_json::to_string(&EffectType::Range).unwrap_or_default();
        assert_eq!(json, "\"range\"");
    }

    #[test]
    fn subscription_type_serializes_snake_case() {
        let json = serde_json::to_string(&SubscriptionType::ResetAbilities).unwrap_or_default();
        assert_eq!(json, "\"reset_abilities\"");
    }

    #[test]
    fn all_periods_are_covered() {
        assert_eq!(StatPeriod::ALL.len(), 4);
    }
}
