//! Experience accumulation and level advancement.
//!
//! # Level-Up Semantics
//!
//! A grant advances the user by **at most one level**, even when the new
//! experience total crosses several tier thresholds at once. Callers award
//! small fixed increments per prayer, so a multi-tier jump resolves itself
//! on the next grant. This single-step behavior is deliberate and matches
//! what the rest of the system (ability-point awards, level-up banners)
//! expects from one grant.
//!
//! Each level-up awards a flat [`POINTS_PER_LEVEL_UP`] ability points,
//! independent of the level reached.

use sanpai_types::LevelTier;

use crate::error::ProgressionError;

/// Ability points granted on each level-up.
pub const POINTS_PER_LEVEL_UP: i64 = 1;

/// Result of applying one experience grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantOutcome {
    /// Level after the grant.
    pub new_level: i64,
    /// Experience total after the grant.
    pub new_exp: i64,
    /// Whether this grant crossed the next tier's threshold.
    pub leveled_up: bool,
    /// Ability points awarded by this grant (0 or [`POINTS_PER_LEVEL_UP`]).
    pub ability_points_gained: i64,
}

/// Apply an experience grant to a user's current progression state.
///
/// `next_tier` is the tier row for `level + 1`, or `None` when the user is
/// at the top of the table (no further level exists; exp still
/// accumulates).
///
/// # Errors
///
/// Returns [`ProgressionError::NegativeGrant`] for a negative amount and
/// [`ProgressionError::ArithmeticOverflow`] if the new total cannot be
/// represented.
pub fn apply_experience(
    level: i64,
    exp: i64,
    amount: i64,
    next_tier: Option<&LevelTier>,
) -> Result<GrantOutcome, ProgressionError> {
    if amount < 0 {
        return Err(ProgressionError::NegativeGrant { amount });
    }

    let new_exp = exp
        .checked_add(amount)
        .ok_or_else(|| ProgressionError::ArithmeticOverflow {
            context: format!("exp {exp} + grant {amount}"),
        })?;

    if let Some(next) = next_tier
        && new_exp >= next.required_exp
    {
        return Ok(GrantOutcome {
            new_level: next.level,
            new_exp,
            leveled_up: true,
            ability_points_gained: POINTS_PER_LEVEL_UP,
        });
    }

    Ok(GrantOutcome {
        new_level: level,
        new_exp,
        leveled_up: false,
        ability_points_gained: 0,
    })
}

/// Progress of a user's experience within their current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    /// Experience accumulated beyond the current tier's requirement.
    pub exp_into_level: i64,
    /// Experience still needed to reach the next tier, or `None` at the
    /// top of the table.
    pub exp_to_next: Option<i64>,
}

/// Compute progress toward the next tier for display purposes.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] on subtraction
/// underflow, which indicates inconsistent tier data (a user holding a
/// level whose requirement exceeds their exp).
pub fn progress_within_level(
    exp: i64,
    current_tier: &LevelTier,
    next_tier: Option<&LevelTier>,
) -> Result<LevelProgress, ProgressionError> {
    let exp_into_level =
        exp.checked_sub(current_tier.required_exp)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!(
                    "exp {exp} below tier requirement {}",
                    current_tier.required_exp
                ),
            })?;

    let exp_to_next = next_tier
        .map(|next| {
            next.required_exp.checked_sub(exp).map(|d| d.max(0)).ok_or_else(|| {
                ProgressionError::ArithmeticOverflow {
                    context: format!("next requirement {} - exp {exp}", next.required_exp),
                }
            })
        })
        .transpose()?;

    Ok(LevelProgress {
        exp_into_level,
        exp_to_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn tier(level: i64, required_exp: i64) -> LevelTier {
        LevelTier {
            level,
            required_exp,
            pray_distance: 100,
            worship_count: 1,
        }
    }

    #[test]
    fn grant_below_threshold_keeps_level() {
        let next = tier(1, 100);
        let out = apply_experience(0, 0, 99, Some(&next)).unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: true,
            ability_points_gained: -1,
        });
        assert_eq!(out.new_level, 0);
        assert_eq!(out.new_exp, 99);
        assert!(!out.leveled_up);
        assert_eq!(out.ability_points_gained, 0);
    }

    #[test]
    fn grant_at_threshold_levels_up() {
        let next = tier(1, 100);
        let out = apply_experience(0, 40, 60, Some(&next)).unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: false,
            ability_points_gained: -1,
        });
        // 40 + 60 = 100 == required: threshold itself levels.
        assert_eq!(out.new_level, 1);
        assert_eq!(out.new_exp, 100);
        assert!(out.leveled_up);
        assert_eq!(out.ability_points_gained, 1);
    }

    #[test]
    fn single_step_even_across_two_thresholds() {
        // Next tier requires 100. A huge grant still advances one level;
        // the tier after that resolves on the following grant.
        let next = tier(1, 100);
        let out = apply_experience(0, 0, 500, Some(&next)).unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: false,
            ability_points_gained: -1,
        });
        assert_eq!(out.new_level, 1);
        assert_eq!(out.new_exp, 500);
        assert_eq!(out.ability_points_gained, 1);
    }

    #[test]
    fn top_of_table_accumulates_without_leveling() {
        let out = apply_experience(10, 5_000, 77, None).unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: true,
            ability_points_gained: -1,
        });
        assert_eq!(out.new_level, 10);
        assert_eq!(out.new_exp, 5_077);
        assert!(!out.leveled_up);
    }

    #[test]
    fn sequential_grants_match_lump_grant() {
        // e1 + e2 crossing a single threshold: sequential and lump grants
        // agree on the final (level, exp).
        let next = tier(1, 100);

        let first = apply_experience(0, 0, 60, Some(&next)).ok();
        let first = first.unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: false,
            ability_points_gained: 0,
        });
        assert!(!first.leveled_up);
        let second =
            apply_experience(first.new_level, first.new_exp, 60, Some(&next)).ok();
        let second = second.unwrap_or(GrantOutcome {
            new_level: -1,
            new_exp: -1,
            leveled_up: false,
            ability_points_gained: 0,
        });

        let lump = apply_experience(0, 0, 120, Some(&next)).ok();
        let lump = lump.unwrap_or(GrantOutcome {
            new_level: -2,
            new_exp: -2,
            leveled_up: false,
            ability_points_gained: 0,
        });

        assert_eq!((second.new_level, second.new_exp), (lump.new_level, lump.new_exp));
    }

    #[test]
    fn negative_grant_rejected() {
        let next = tier(1, 100);
        assert!(matches!(
            apply_experience(0, 0, -5, Some(&next)),
            Err(ProgressionError::NegativeGrant { amount: -5 })
        ));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(
            apply_experience(0, i64::MAX, 1, None),
            Err(ProgressionError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn progress_reports_both_directions() {
        let current = tier(2, 300);
        let next = tier(3, 600);
        let p = progress_within_level(450, &current, Some(&next)).ok();
        let p = p.unwrap_or(LevelProgress {
            exp_into_level: -1,
            exp_to_next: None,
        });
        // 450 - 300 = 150 into the level; 600 - 450 = 150 to go.
        assert_eq!(p.exp_into_level, 150);
        assert_eq!(p.exp_to_next, Some(150));
    }

    #[test]
    fn progress_at_top_has_no_next() {
        let current = tier(10, 5_500);
        let p = progress_within_level(6_000, &current, None).ok();
        let p = p.unwrap_or(LevelProgress {
            exp_into_level: -1,
            exp_to_next: Some(-1),
        });
        assert_eq!(p.exp_into_level, 500);
        assert_eq!(p.exp_to_next, None);
    }
}
