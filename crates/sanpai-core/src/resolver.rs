//! Derived gameplay numbers: pray radius and daily worship quota.
//!
//! [`EffectResolver::resolve`] is a pure function of current store state:
//! level-tier base values, the flat sum of owned ability bonuses of the
//! matching effect type, and the single live subscription per type. It
//! holds no cache; callers may cache short-term but must accept
//! staleness.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sanpai_db::{AbilityStore, SubscriptionStore, UserStore};
use sanpai_progression::{pray_distance_meters, progress_within_level, worship_quota};
use sanpai_types::{EffectType, SubscriptionType, UserId};

use crate::error::CoreError;

/// The two derived numbers the prayer flows depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedEffects {
    /// Allowed physical pray radius in meters.
    pub pray_distance_meters: i64,
    /// Daily remote-worship quota.
    pub daily_worship_quota: i64,
}

/// A read-only projection of a user's progression state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    /// Current level.
    pub level: i64,
    /// Accumulated experience.
    pub exp: i64,
    /// Experience accumulated beyond the current tier's requirement.
    pub exp_into_level: i64,
    /// Experience still needed for the next tier, or `None` at the top.
    pub exp_to_next: Option<i64>,
    /// Unspent ability points.
    pub ability_points: i64,
}

/// Resolves derived gameplay numbers from the store.
pub struct EffectResolver<'a> {
    pool: &'a PgPool,
}

impl<'a> EffectResolver<'a> {
    /// Create a resolver bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the user's pray radius and daily worship quota at `now`.
    ///
    /// Steps: level-tier base values (a missing tier row is fatal), flat
    /// ability sums per effect type, then the live subscription effects --
    /// a range multiplier doubles the ability-adjusted distance, a worship
    /// boost adds one to the ability-adjusted quota.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UserNotFound`] for an unknown user,
    /// [`CoreError::Configuration`] for a missing level tier, or a
    /// storage error.
    pub async fn resolve(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<DerivedEffects, CoreError> {
        let users = UserStore::new(self.pool);
        let user = users.get_user(user_id).await?;
        let tier = users.get_tier(user.level).await?;

        let abilities = AbilityStore::new(self.pool);
        let range_sum = abilities.sum_effect(user_id, EffectType::Range).await?;
        let worship_sum = abilities.sum_effect(user_id, EffectType::Worship).await?;

        let subscriptions = SubscriptionStore::new(self.pool);
        let has_range_multiplier = subscriptions
            .active(user_id, SubscriptionType::RangeMultiplier, now)
            .await?
            .is_some();
        let has_worship_boost = subscriptions
            .active(user_id, SubscriptionType::WorshipBoost, now)
            .await?
            .is_some();

        let effects = DerivedEffects {
            pray_distance_meters: pray_distance_meters(
                tier.pray_distance,
                range_sum,
                has_range_multiplier,
            )?,
            daily_worship_quota: worship_quota(tier.worship_count, worship_sum, has_worship_boost)?,
        };

        tracing::debug!(
            user = %user_id,
            distance = effects.pray_distance_meters,
            quota = effects.daily_worship_quota,
            "Effects resolved"
        );
        Ok(effects)
    }

    /// Project a user's level, experience progress, and ability points.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UserNotFound`] for an unknown user or
    /// [`CoreError::Configuration`] for a missing level tier.
    pub async fn level_info(&self, user_id: UserId) -> Result<LevelInfo, CoreError> {
        let users = UserStore::new(self.pool);
        let user = users.get_user(user_id).await?;
        let current = users.get_tier(user.level).await?;
        let next_level =
            user.level
                .checked_add(1)
                .ok_or_else(|| CoreError::Configuration(format!(
                    "level {} + 1 overflows",
                    user.level
                )))?;
        let next = users.get_tier_opt(next_level).await?;

        let progress = progress_within_level(user.exp, &current, next.as_ref())?;

        Ok(LevelInfo {
            level: user.level,
            exp: user.exp,
            exp_into_level: progress.exp_into_level,
            exp_to_next: progress.exp_to_next,
            ability_points: user.ability_points,
        })
    }
}
