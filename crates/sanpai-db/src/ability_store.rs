//! Ability reference data, ownership, and the purchase/reset transactions.
//!
//! Both mutations lock the user row first (`SELECT ... FOR UPDATE`), so
//! purchases, resets, and experience grants for one user serialize against
//! each other. The `(user_id, ability_id)` uniqueness constraint on
//! `user_abilities` is the final backstop: if two purchases for the same
//! pair race past the in-transaction check, the second insert fails and is
//! reported as an already-owned rejection, never a duplicate row.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sanpai_progression::{ProgressionError, PurchaseDenied, check_purchase, refund_total};
use sanpai_types::{
    AbilityDefinition, AbilityId, AbilityLedgerEntry, EffectType, LedgerEntryId, UserAbility,
    UserId,
};

use crate::error::DbError;

/// Result of a successful ability purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The purchased ability.
    pub ability_id: AbilityId,
    /// Points spent.
    pub cost: i64,
    /// Points remaining after the debit.
    pub remaining_points: i64,
}

/// Result of a successful ability-tree reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReceipt {
    /// Total points refunded (sum of owned ability costs).
    pub refunded_points: i64,
    /// Number of abilities revoked.
    pub abilities_revoked: usize,
}

/// Operations on the `ability_definitions`, `user_abilities`, and
/// `ability_ledger` tables.
pub struct AbilityStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AbilityStore<'a> {
    /// Create a new ability store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one ability definition.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::AbilityNotFound`] if no row exists.
    pub async fn get_definition(&self, ability_id: AbilityId) -> Result<AbilityDefinition, DbError> {
        let row = sqlx::query_as::<_, AbilityDefRow>(
            r"SELECT id, name, cost, effect_type, effect_value, prerequisite_ability_id
              FROM ability_definitions
              WHERE id = $1",
        )
        .bind(ability_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or(DbError::AbilityNotFound(ability_id))?;

        row.into_definition()
    }

    /// Fetch the full ability table keyed by id.
    ///
    /// Used at startup to validate the prerequisite graph.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_definitions(
        &self,
    ) -> Result<BTreeMap<AbilityId, AbilityDefinition>, DbError> {
        let rows = sqlx::query_as::<_, AbilityDefRow>(
            r"SELECT id, name, cost, effect_type, effect_value, prerequisite_ability_id
              FROM ability_definitions
              ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        let mut defs = BTreeMap::new();
        for row in rows {
            let def = row.into_definition()?;
            defs.insert(def.id, def);
        }
        Ok(defs)
    }

    /// The set of ability ids a user currently owns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn owned_ability_ids(&self, user_id: UserId) -> Result<BTreeSet<AbilityId>, DbError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r"SELECT ability_id FROM user_abilities WHERE user_id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| AbilityId(id)).collect())
    }

    /// List a user's owned abilities with acquisition timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_owned(&self, user_id: UserId) -> Result<Vec<UserAbility>, DbError> {
        let rows = sqlx::query_as::<_, UserAbilityRow>(
            r"SELECT user_id, ability_id, acquired_at
              FROM user_abilities
              WHERE user_id = $1
              ORDER BY acquired_at",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(UserAbilityRow::into_user_ability).collect())
    }

    /// Sum the `effect_value` of all owned abilities of one effect type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn sum_effect(
        &self,
        user_id: UserId,
        effect_type: EffectType,
    ) -> Result<i64, DbError> {
        // SUM(BIGINT) widens to NUMERIC in PostgreSQL; cast back.
        let (sum,): (i64,) = sqlx::query_as(
            r"SELECT COALESCE(SUM(d.effect_value), 0)::BIGINT
              FROM user_abilities ua
              JOIN ability_definitions d ON d.id = ua.ability_id
              WHERE ua.user_id = $1 AND d.effect_type = $2",
        )
        .bind(user_id.into_inner())
        .bind(effect_type_to_db(effect_type))
        .fetch_one(self.pool)
        .await?;

        Ok(sum)
    }

    /// List a user's ability ledger entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn ledger_entries(&self, user_id: UserId) -> Result<Vec<AbilityLedgerEntry>, DbError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r"SELECT id, user_id, ability_id, points_spent, created_at
              FROM ability_ledger
              WHERE user_id = $1
              ORDER BY created_at, id",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(LedgerRow::into_entry).collect())
    }

    /// Atomically purchase an ability.
    ///
    /// One transaction: lock the user row, re-validate the gameplay gates
    /// under the lock, debit the cost, insert the ownership row, append a
    /// positive ledger entry. Either every write commits or none does.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UserNotFound`] / [`DbError::AbilityNotFound`]
    /// for missing rows, [`DbError::Purchase`] for a refused purchase
    /// (including the uniqueness-backstop race), or [`DbError::Postgres`]
    /// if any statement fails.
    pub async fn purchase(
        &self,
        user_id: UserId,
        ability_id: AbilityId,
        now: DateTime<Utc>,
    ) -> Result<PurchaseReceipt, DbError> {
        let mut tx = self.pool.begin().await?;

        let (points,): (i64,) = sqlx::query_as(
            r"SELECT ability_points FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        let def = sqlx::query_as::<_, AbilityDefRow>(
            r"SELECT id, name, cost, effect_type, effect_value, prerequisite_ability_id
              FROM ability_definitions
              WHERE id = $1",
        )
        .bind(ability_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::AbilityNotFound(ability_id))?
        .into_definition()?;

        let owned_rows: Vec<(i32,)> = sqlx::query_as(
            r"SELECT ability_id FROM user_abilities WHERE user_id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_all(&mut *tx)
        .await?;
        let owned: BTreeSet<AbilityId> =
            owned_rows.into_iter().map(|(id,)| AbilityId(id)).collect();

        check_purchase(&def, &owned, points)?;

        let remaining = points
            .checked_sub(def.cost)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("points {points} - cost {}", def.cost),
            })
            .map_err(DbError::Rules)?;

        sqlx::query(r"UPDATE users SET ability_points = $2 WHERE id = $1")
            .bind(user_id.into_inner())
            .bind(remaining)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"INSERT INTO user_abilities (user_id, ability_id, acquired_at)
              VALUES ($1, $2, $3)",
        )
        .bind(user_id.into_inner())
        .bind(ability_id.into_inner())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if DbError::is_unique_violation(&e) {
                DbError::Purchase(PurchaseDenied::AlreadyOwned)
            } else {
                DbError::Postgres(e)
            }
        })?;

        sqlx::query(
            r"INSERT INTO ability_ledger (id, user_id, ability_id, points_spent, created_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(LedgerEntryId::new().into_inner())
        .bind(user_id.into_inner())
        .bind(ability_id.into_inner())
        .bind(def.cost)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            user = %user_id,
            ability = %ability_id,
            cost = def.cost,
            remaining,
            "Ability purchased"
        );
        Ok(PurchaseReceipt {
            ability_id,
            cost: def.cost,
            remaining_points: remaining,
        })
    }

    /// Atomically reset the user's ability tree, refunding all costs.
    ///
    /// Requires an active, unexpired `reset_abilities` subscription, which
    /// the reset consumes (deactivates) so it cannot be repeated without
    /// repurchasing. One transaction: lock the user row, verify and lock
    /// the subscription, sum the owned costs, credit the points, delete
    /// every ownership row, append one ledger row per formerly-owned
    /// ability -- each recording the *full* refunded total, not a
    /// per-ability share -- and deactivate the subscription.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UserNotFound`],
    /// [`DbError::SubscriptionRequired`] when no live subscription exists,
    /// or [`DbError::Postgres`] if any statement fails.
    pub async fn reset(&self, user_id: UserId, now: DateTime<Utc>) -> Result<ResetReceipt, DbError> {
        let mut tx = self.pool.begin().await?;

        let (points,): (i64,) = sqlx::query_as(
            r"SELECT ability_points FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        let subscription: Option<(Uuid,)> = sqlx::query_as(
            r"SELECT id
              FROM subscriptions
              WHERE user_id = $1
                AND subscription_type = 'reset_abilities'
                AND is_active
                AND expires_at > $2
              ORDER BY started_at DESC
              LIMIT 1
              FOR UPDATE",
        )
        .bind(user_id.into_inner())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        let (subscription_id,) = subscription.ok_or(DbError::SubscriptionRequired(user_id))?;

        let owned_rows = sqlx::query_as::<_, AbilityDefRow>(
            r"SELECT d.id, d.name, d.cost, d.effect_type, d.effect_value, d.prerequisite_ability_id
              FROM ability_definitions d
              JOIN user_abilities ua ON ua.ability_id = d.id
              WHERE ua.user_id = $1
              ORDER BY d.id",
        )
        .bind(user_id.into_inner())
        .fetch_all(&mut *tx)
        .await?;

        let mut owned_defs = Vec::with_capacity(owned_rows.len());
        for row in owned_rows {
            owned_defs.push(row.into_definition()?);
        }

        let total = refund_total(owned_defs.iter())?;
        let refund_entry = total
            .checked_neg()
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("negating refund total {total}"),
            })
            .map_err(DbError::Rules)?;

        let new_points = points
            .checked_add(total)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("points {points} + refund {total}"),
            })
            .map_err(DbError::Rules)?;

        sqlx::query(r"UPDATE users SET ability_points = $2 WHERE id = $1")
            .bind(user_id.into_inner())
            .bind(new_points)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r"DELETE FROM user_abilities WHERE user_id = $1")
            .bind(user_id.into_inner())
            .execute(&mut *tx)
            .await?;

        for def in &owned_defs {
            sqlx::query(
                r"INSERT INTO ability_ledger (id, user_id, ability_id, points_spent, created_at)
                  VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(LedgerEntryId::new().into_inner())
            .bind(user_id.into_inner())
            .bind(def.id.into_inner())
            .bind(refund_entry)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(r"UPDATE subscriptions SET is_active = FALSE WHERE id = $1")
            .bind(subscription_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user = %user_id,
            refunded = total,
            revoked = owned_defs.len(),
            "Ability tree reset"
        );
        Ok(ResetReceipt {
            refunded_points: total,
            abilities_revoked: owned_defs.len(),
        })
    }
}

/// A row from the `ability_definitions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AbilityDefRow {
    /// Ability id.
    id: i32,
    /// Ability name.
    name: String,
    /// Purchase cost.
    cost: i64,
    /// Effect type as stored (`range` | `worship` | `other`).
    effect_type: String,
    /// Flat effect contribution.
    effect_value: i64,
    /// Prerequisite ability id, if any.
    prerequisite_ability_id: Option<i32>,
}

impl AbilityDefRow {
    /// Convert to the domain [`AbilityDefinition`] type.
    fn into_definition(self) -> Result<AbilityDefinition, DbError> {
        let effect_type = effect_type_from_db(&self.effect_type).ok_or_else(|| {
            DbError::Config(format!(
                "ability {} has unknown effect type {:?}",
                self.id, self.effect_type
            ))
        })?;
        Ok(AbilityDefinition {
            id: AbilityId(self.id),
            name: self.name,
            cost: self.cost,
            effect_type,
            effect_value: self.effect_value,
            prerequisite_ability_id: self.prerequisite_ability_id.map(AbilityId),
        })
    }
}

/// A row from the `user_abilities` table.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct UserAbilityRow {
    /// Owning user UUID.
    user_id: Uuid,
    /// Owned ability id.
    ability_id: i32,
    /// When the purchase happened.
    acquired_at: DateTime<Utc>,
}

impl UserAbilityRow {
    /// Convert to the domain [`UserAbility`] type.
    const fn into_user_ability(self) -> UserAbility {
        UserAbility {
            user_id: UserId(self.user_id),
            ability_id: AbilityId(self.ability_id),
            acquired_at: self.acquired_at,
        }
    }
}

/// A row from the `ability_ledger` table.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct LedgerRow {
    /// Ledger row UUID.
    id: Uuid,
    /// User whose points moved.
    user_id: Uuid,
    /// Ability involved.
    ability_id: i32,
    /// Signed point movement.
    points_spent: i64,
    /// Row creation timestamp.
    created_at: DateTime<Utc>,
}

impl LedgerRow {
    /// Convert to the domain [`AbilityLedgerEntry`] type.
    const fn into_entry(self) -> AbilityLedgerEntry {
        AbilityLedgerEntry {
            id: LedgerEntryId(self.id),
            user_id: UserId(self.user_id),
            ability_id: AbilityId(self.ability_id),
            points_spent: self.points_spent,
            created_at: self.created_at,
        }
    }
}

/// Convert an [`EffectType`] to its database string representation.
const fn effect_type_to_db(effect_type: EffectType) -> &'static str {
    match effect_type {
        EffectType::Range => "range",
        EffectType::Worship => "worship",
        EffectType::Other => "other",
    }
}

/// Parse an [`EffectType`] from its database string representation.
fn effect_type_from_db(s: &str) -> Option<EffectType> {
    match s {
        "range" => Some(EffectType::Range),
        "worship" => Some(EffectType::Worship),
        "other" => Some(EffectType::Other),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_type_db_roundtrip() {
        for et in [EffectType::Range, EffectType::Worship, EffectType::Other] {
            assert_eq!(effect_type_from_db(effect_type_to_db(et)), Some(et));
        }
        assert_eq!(effect_type_from_db("bogus"), None);
    }
}
