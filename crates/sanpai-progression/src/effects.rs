//! Derived-stat formulas: pray distance and daily worship quota.
//!
//! Both stats combine three layers:
//!
//! 1. the level tier's base value,
//! 2. the flat sum of owned ability `effect_value`s of the matching type,
//! 3. the active subscription effect, if any.
//!
//! A range subscription *doubles* the ability-adjusted distance; a worship
//! subscription adds a flat +1 to the ability-adjusted quota. Abilities
//! contribute before the multiplier, so range abilities are doubled too.

use crate::error::ProgressionError;

/// Distance multiplier applied by an active `range_multiplier` subscription.
pub const RANGE_SUBSCRIPTION_MULTIPLIER: i64 = 2;

/// Quota bonus applied by an active `worship_boost` subscription.
pub const WORSHIP_SUBSCRIPTION_BONUS: i64 = 1;

/// Resolved pray distance in meters.
///
/// `(base + ability_sum) * 2` with an active range subscription, else
/// `base + ability_sum`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if the combination
/// overflows `i64`.
pub fn pray_distance_meters(
    base: i64,
    ability_sum: i64,
    has_range_multiplier: bool,
) -> Result<i64, ProgressionError> {
    let adjusted = base
        .checked_add(ability_sum)
        .ok_or_else(|| ProgressionError::ArithmeticOverflow {
            context: format!("distance base {base} + abilities {ability_sum}"),
        })?;

    if has_range_multiplier {
        adjusted
            .checked_mul(RANGE_SUBSCRIPTION_MULTIPLIER)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("distance {adjusted} * subscription multiplier"),
            })
    } else {
        Ok(adjusted)
    }
}

/// Resolved daily remote-worship quota.
///
/// `base + ability_sum + 1` with an active worship subscription, else
/// `base + ability_sum`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if the combination
/// overflows `i64`.
pub fn worship_quota(
    base: i64,
    ability_sum: i64,
    has_worship_boost: bool,
) -> Result<i64, ProgressionError> {
    let adjusted = base
        .checked_add(ability_sum)
        .ok_or_else(|| ProgressionError::ArithmeticOverflow {
            context: format!("quota base {base} + abilities {ability_sum}"),
        })?;

    if has_worship_boost {
        adjusted
            .checked_add(WORSHIP_SUBSCRIPTION_BONUS)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("quota {adjusted} + subscription bonus"),
            })
    } else {
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_without_subscription() {
        // 100 base + 50 from abilities = 150
        assert_eq!(pray_distance_meters(100, 50, false).ok(), Some(150));
    }

    #[test]
    fn distance_with_multiplier_doubles_abilities_too() {
        // (100 + 50) * 2 = 300, not 100 * 2 + 50 = 250
        assert_eq!(pray_distance_meters(100, 50, true).ok(), Some(300));
    }

    #[test]
    fn distance_with_no_abilities() {
        assert_eq!(pray_distance_meters(100, 0, true).ok(), Some(200));
    }

    #[test]
    fn quota_without_boost() {
        assert_eq!(worship_quota(1, 2, false).ok(), Some(3));
    }

    #[test]
    fn quota_with_boost_adds_one() {
        // (1 + 2) + 1 = 4
        assert_eq!(worship_quota(1, 2, true).ok(), Some(4));
    }

    #[test]
    fn zero_everything_is_zero_quota() {
        // Level-0 users with no abilities and no subscription get quota 0:
        // their first remote prayer is rejected.
        assert_eq!(worship_quota(0, 0, false).ok(), Some(0));
    }

    #[test]
    fn distance_overflow_detected() {
        assert!(pray_distance_meters(i64::MAX, 1, false).is_err());
        assert!(pray_distance_meters(i64::MAX / 2 + 1, 0, true).is_err());
    }
}
