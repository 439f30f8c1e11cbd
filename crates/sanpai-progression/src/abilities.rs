//! Ability-tree gating: purchase preconditions, refunds, and reference-data
//! validation.
//!
//! The pure checks here are re-run by the data layer *inside* its purchase
//! transaction; the store's uniqueness constraint remains the final
//! backstop against a duplicate-purchase race between check and write.

use std::collections::{BTreeMap, BTreeSet};

use sanpai_types::{AbilityDefinition, AbilityId};

use crate::error::ProgressionError;

/// Why a purchase request was refused.
///
/// These are expected gameplay outcomes, surfaced to the caller with a
/// descriptive message and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseDenied {
    /// The user already owns this ability.
    #[error("ability already owned")]
    AlreadyOwned,

    /// The ability's prerequisite is not owned.
    #[error("prerequisite ability {required} not owned")]
    PrerequisiteNotMet {
        /// The prerequisite that must be owned first.
        required: AbilityId,
    },

    /// The user cannot afford the ability.
    #[error("insufficient ability points: need {required}, have {available}")]
    InsufficientPoints {
        /// The ability's cost.
        required: i64,
        /// The user's current point balance.
        available: i64,
    },
}

/// Check whether a user may purchase an ability.
///
/// Evaluates, in order: uniqueness (not already owned), prerequisite
/// ownership, affordability. The first failed gate wins.
///
/// # Errors
///
/// Returns the [`PurchaseDenied`] reason when any gate fails.
pub fn check_purchase(
    def: &AbilityDefinition,
    owned: &BTreeSet<AbilityId>,
    ability_points: i64,
) -> Result<(), PurchaseDenied> {
    if owned.contains(&def.id) {
        return Err(PurchaseDenied::AlreadyOwned);
    }
    if let Some(required) = def.prerequisite_ability_id
        && !owned.contains(&required)
    {
        return Err(PurchaseDenied::PrerequisiteNotMet { required });
    }
    if ability_points < def.cost {
        return Err(PurchaseDenied::InsufficientPoints {
            required: def.cost,
            available: ability_points,
        });
    }
    Ok(())
}

/// Total points refunded by a full ability-tree reset.
///
/// The sum of the costs of every currently-owned ability.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if the sum overflows.
pub fn refund_total<'a, I>(owned_defs: I) -> Result<i64, ProgressionError>
where
    I: IntoIterator<Item = &'a AbilityDefinition>,
{
    let mut total: i64 = 0;
    for def in owned_defs {
        total = total
            .checked_add(def.cost)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("refund total + cost of ability {}", def.id),
            })?;
    }
    Ok(total)
}

/// Validate the prerequisite graph of the full ability table.
///
/// Reference data must satisfy two invariants: every prerequisite id
/// resolves, and following prerequisite links never loops. Run once at
/// startup; a violation is an operational error, not a user error.
///
/// # Errors
///
/// Returns [`ProgressionError::UnknownPrerequisite`] for a dangling
/// reference or [`ProgressionError::PrerequisiteCycle`] for a loop.
pub fn validate_prerequisites(
    defs: &BTreeMap<AbilityId, AbilityDefinition>,
) -> Result<(), ProgressionError> {
    for def in defs.values() {
        // Walk the chain from this ability; a well-formed tree terminates
        // in at most |defs| hops.
        let mut seen = BTreeSet::new();
        seen.insert(def.id);
        let mut cursor = def.prerequisite_ability_id;
        while let Some(parent_id) = cursor {
            let parent =
                defs.get(&parent_id)
                    .ok_or(ProgressionError::UnknownPrerequisite {
                        ability: def.id,
                        prerequisite: parent_id,
                    })?;
            if !seen.insert(parent_id) {
                return Err(ProgressionError::PrerequisiteCycle { ability: parent_id });
            }
            cursor = parent.prerequisite_ability_id;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanpai_types::EffectType;

    fn def(id: i32, cost: i64, prereq: Option<i32>) -> AbilityDefinition {
        AbilityDefinition {
            id: AbilityId(id),
            name: format!("ability-{id}"),
            cost,
            effect_type: EffectType::Range,
            effect_value: 10,
            prerequisite_ability_id: prereq.map(AbilityId),
        }
    }

    // -----------------------------------------------------------------------
    // check_purchase
    // -----------------------------------------------------------------------

    #[test]
    fn purchase_root_ability_with_enough_points() {
        let a = def(1, 100, None);
        assert_eq!(check_purchase(&a, &BTreeSet::new(), 100), Ok(()));
    }

    #[test]
    fn already_owned_wins_over_everything() {
        let a = def(1, 100, None);
        let owned = BTreeSet::from([AbilityId(1)]);
        // Even with zero points the reported reason is AlreadyOwned.
        assert_eq!(
            check_purchase(&a, &owned, 0),
            Err(PurchaseDenied::AlreadyOwned)
        );
    }

    #[test]
    fn prerequisite_gate() {
        let b = def(2, 50, Some(1));
        assert_eq!(
            check_purchase(&b, &BTreeSet::new(), 500),
            Err(PurchaseDenied::PrerequisiteNotMet {
                required: AbilityId(1)
            })
        );

        let owned = BTreeSet::from([AbilityId(1)]);
        assert_eq!(check_purchase(&b, &owned, 500), Ok(()));
    }

    #[test]
    fn affordability_gate() {
        let a = def(1, 100, None);
        assert_eq!(
            check_purchase(&a, &BTreeSet::new(), 99),
            Err(PurchaseDenied::InsufficientPoints {
                required: 100,
                available: 99
            })
        );
    }

    // -----------------------------------------------------------------------
    // refund_total
    // -----------------------------------------------------------------------

    #[test]
    fn refund_sums_owned_costs() {
        let defs = [def(1, 100, None), def(2, 50, Some(1)), def(3, 75, None)];
        // 100 + 50 + 75 = 225
        assert_eq!(refund_total(defs.iter()).ok(), Some(225));
    }

    #[test]
    fn refund_of_nothing_is_zero() {
        assert_eq!(refund_total([].iter()).ok(), Some(0));
    }

    #[test]
    fn refund_overflow_detected() {
        let defs = [def(1, i64::MAX, None), def(2, 1, None)];
        assert!(refund_total(defs.iter()).is_err());
    }

    // -----------------------------------------------------------------------
    // validate_prerequisites
    // -----------------------------------------------------------------------

    fn table(defs: Vec<AbilityDefinition>) -> BTreeMap<AbilityId, AbilityDefinition> {
        defs.into_iter().map(|d| (d.id, d)).collect()
    }

    #[test]
    fn valid_chain_passes() {
        let defs = table(vec![def(1, 100, None), def(2, 50, Some(1)), def(3, 25, Some(2))]);
        assert!(validate_prerequisites(&defs).is_ok());
    }

    #[test]
    fn dangling_prerequisite_detected() {
        let defs = table(vec![def(1, 100, Some(99))]);
        assert!(matches!(
            validate_prerequisites(&defs),
            Err(ProgressionError::UnknownPrerequisite { .. })
        ));
    }

    #[test]
    fn cycle_detected() {
        // 1 -> 2 -> 1
        let defs = table(vec![def(1, 100, Some(2)), def(2, 50, Some(1))]);
        assert!(matches!(
            validate_prerequisites(&defs),
            Err(ProgressionError::PrerequisiteCycle { .. })
        ));
    }

    #[test]
    fn self_cycle_detected() {
        let defs = table(vec![def(1, 100, Some(1))]);
        assert!(matches!(
            validate_prerequisites(&defs),
            Err(ProgressionError::PrerequisiteCycle { .. })
        ));
    }
}
