//! Subscription lookups with lazy expiry.
//!
//! No background job sweeps expired subscriptions, so every read filters
//! on `expires_at` as well as `is_active`. When several live rows of the
//! same type exist (a billing hiccup, an overlapping renewal), the most
//! recently started one wins.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sanpai_types::{Subscription, SubscriptionId, SubscriptionType, UserId};

use crate::error::DbError;

/// Operations on the `subscriptions` table.
pub struct SubscriptionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionStore<'a> {
    /// Create a new subscription store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's live subscription of the given type, if any.
    ///
    /// Live means `is_active` and `expires_at > now`. Rows whose expiry
    /// has passed are treated as inactive even when the flag was never
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn active(
        &self,
        user_id: UserId,
        subscription_type: SubscriptionType,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>, DbError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"SELECT id, user_id, subscription_type, is_active, started_at, expires_at
              FROM subscriptions
              WHERE user_id = $1
                AND subscription_type = $2
                AND is_active
                AND expires_at > $3
              ORDER BY started_at DESC
              LIMIT 1",
        )
        .bind(user_id.into_inner())
        .bind(subscription_type_to_db(subscription_type))
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(SubscriptionRow::into_subscription).transpose()
    }
}

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionRow {
    /// Subscription UUID.
    id: Uuid,
    /// Subscribed user UUID.
    user_id: Uuid,
    /// Subscription type as stored.
    subscription_type: String,
    /// Active flag.
    is_active: bool,
    /// Billing window start.
    started_at: DateTime<Utc>,
    /// Billing window end.
    expires_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the domain [`Subscription`] type.
    fn into_subscription(self) -> Result<Subscription, DbError> {
        let subscription_type =
            subscription_type_from_db(&self.subscription_type).ok_or_else(|| {
                DbError::Config(format!(
                    "subscription {} has unknown type {:?}",
                    self.id, self.subscription_type
                ))
            })?;
        Ok(Subscription {
            id: SubscriptionId(self.id),
            user_id: UserId(self.user_id),
            subscription_type,
            is_active: self.is_active,
            started_at: self.started_at,
            expires_at: self.expires_at,
        })
    }
}

/// Convert a [`SubscriptionType`] to its database string representation.
pub(crate) const fn subscription_type_to_db(subscription_type: SubscriptionType) -> &'static str {
    match subscription_type {
        SubscriptionType::RangeMultiplier => "range_multiplier",
        SubscriptionType::WorshipBoost => "worship_boost",
        SubscriptionType::ResetAbilities => "reset_abilities",
    }
}

/// Parse a [`SubscriptionType`] from its database string representation.
fn subscription_type_from_db(s: &str) -> Option<SubscriptionType> {
    match s {
        "range_multiplier" => Some(SubscriptionType::RangeMultiplier),
        "worship_boost" => Some(SubscriptionType::WorshipBoost),
        "reset_abilities" => Some(SubscriptionType::ResetAbilities),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_type_db_roundtrip() {
        for st in [
            SubscriptionType::RangeMultiplier,
            SubscriptionType::WorshipBoost,
            SubscriptionType::ResetAbilities,
        ] {
            assert_eq!(subscription_type_from_db(subscription_type_to_db(st)), Some(st));
        }
        assert_eq!(subscription_type_from_db("bogus"), None);
    }
}
