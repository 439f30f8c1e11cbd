//! The prayer flows: geofenced physical prayer and quota-limited remote
//! prayer.
//!
//! A physical prayer: geofence check against the resolved pray radius ->
//! statistics fan-out (four shrine tables plus four tables per enshrined
//! deity) -> experience grant. A remote prayer: quota check -> event
//! append -> shrine statistics only -> experience grant.
//!
//! The statistics fan-out is per-row atomic, not all-or-nothing: each
//! table increment is its own upsert, and a crash mid-fan-out leaves some
//! ledgers one count behind. The experience grant itself is a single
//! transaction.

use chrono::{Local, Utc};
use sqlx::PgPool;

use sanpai_db::{QuotaStore, ShrineStore, StatBuckets, StatsStore, UserStore};
use sanpai_geo::validate;
use sanpai_types::{Position, PrayerTarget, ShrineId, StatPeriod, UserId};

use crate::config::GameplayConfig;
use crate::error::CoreError;
use crate::quota::QuotaTracker;
use crate::resolver::EffectResolver;

/// The response payload of a successful prayer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerOutcome {
    /// The user's all-time prayer count at this shrine after this prayer.
    pub count: i64,
    /// Whether the experience grant crossed a level threshold.
    pub leveled_up: bool,
    /// The user's level after the grant.
    pub new_level: i64,
    /// Ability points awarded by the grant.
    pub ability_points_gained: i64,
    /// Computed distance to the shrine; absent for remote prayers.
    pub distance_meters: Option<f64>,
    /// The radius the distance was checked against; absent for remote
    /// prayers.
    pub allowed_radius_meters: Option<i64>,
}

/// Orchestrates the two prayer flows.
pub struct PrayerService<'a> {
    pool: &'a PgPool,
    gameplay: GameplayConfig,
}

impl<'a> PrayerService<'a> {
    /// Create a prayer service bound to a connection pool.
    pub const fn new(pool: &'a PgPool, gameplay: GameplayConfig) -> Self {
        Self { pool, gameplay }
    }

    /// Perform a geofence-validated physical prayer.
    ///
    /// `position` is the caller's claimed location; its absence is a
    /// [`CoreError::MissingPosition`] rejection, never an implicit pass.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShrineNotFound`] / [`CoreError::UserNotFound`]
    /// for missing rows, [`CoreError::OutOfRange`] when the geofence
    /// check fails, [`CoreError::Configuration`] for broken reference
    /// data, or a storage error.
    pub async fn pray(
        &self,
        user_id: UserId,
        shrine_id: ShrineId,
        position: Option<Position>,
    ) -> Result<PrayerOutcome, CoreError> {
        let position = position.ok_or(CoreError::MissingPosition)?;

        let shrines = ShrineStore::new(self.pool);
        let shrine = shrines.get_shrine(shrine_id).await?;

        let now = Utc::now();
        let effects = EffectResolver::new(self.pool).resolve(user_id, now).await?;
        let allowed = effects.pray_distance_meters;

        let check = validate(position, shrine.position(), radius_as_f64(allowed))?;
        if !check.ok {
            tracing::debug!(
                user = %user_id,
                shrine = %shrine_id,
                distance = check.distance_meters,
                allowed,
                "Prayer rejected by geofence"
            );
            return Err(CoreError::OutOfRange {
                distance_meters: check.distance_meters,
                allowed_radius_meters: allowed,
            });
        }

        let stats = StatsStore::new(self.pool);
        let buckets = StatBuckets::from_date(Local::now().date_naive());
        stats
            .record_prayer(PrayerTarget::Shrine, shrine_id.into_inner(), user_id, buckets)
            .await?;
        for deity_id in shrines.enshrined_deities(shrine_id).await? {
            stats
                .record_prayer(PrayerTarget::Deity, deity_id.into_inner(), user_id, buckets)
                .await?;
        }

        let grant = UserStore::new(self.pool)
            .grant_experience(user_id, self.gameplay.pray_exp)
            .await?;

        let count = stats
            .get_count(
                PrayerTarget::Shrine,
                StatPeriod::AllTime,
                shrine_id.into_inner(),
                user_id,
                buckets,
            )
            .await?
            .unwrap_or(0);

        tracing::info!(
            user = %user_id,
            shrine = %shrine_id,
            count,
            leveled_up = grant.leveled_up,
            "Physical prayer recorded"
        );
        Ok(PrayerOutcome {
            count,
            leveled_up: grant.leveled_up,
            new_level: grant.new_level,
            ability_points_gained: grant.ability_points_gained,
            distance_meters: Some(check.distance_meters),
            allowed_radius_meters: Some(allowed),
        })
    }

    /// Perform a remote prayer under the daily worship quota.
    ///
    /// Remote prayers touch shrine statistics only -- the deity fan-out is
    /// reserved for physical visits.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RateLimitExceeded`] when today's quota is
    /// used up, plus the same lookup/storage errors as
    /// [`PrayerService::pray`].
    pub async fn remote_pray(
        &self,
        user_id: UserId,
        shrine_id: ShrineId,
    ) -> Result<PrayerOutcome, CoreError> {
        let shrines = ShrineStore::new(self.pool);
        shrines.get_shrine(shrine_id).await?;

        let now = Utc::now();
        let effects = EffectResolver::new(self.pool).resolve(user_id, now).await?;
        let quota = effects.daily_worship_quota;

        let used = QuotaTracker::new(self.pool)
            .remote_worships_today(user_id)
            .await?;
        if used >= quota {
            tracing::debug!(
                user = %user_id,
                shrine = %shrine_id,
                used,
                quota,
                "Remote prayer rejected by quota"
            );
            return Err(CoreError::RateLimitExceeded { quota });
        }

        QuotaStore::new(self.pool)
            .record_event(shrine_id, user_id, now)
            .await?;

        let stats = StatsStore::new(self.pool);
        let buckets = StatBuckets::from_date(Local::now().date_naive());
        stats
            .record_prayer(PrayerTarget::Shrine, shrine_id.into_inner(), user_id, buckets)
            .await?;

        let grant = UserStore::new(self.pool)
            .grant_experience(user_id, self.gameplay.remote_pray_exp)
            .await?;

        let count = stats
            .get_count(
                PrayerTarget::Shrine,
                StatPeriod::AllTime,
                shrine_id.into_inner(),
                user_id,
                buckets,
            )
            .await?
            .unwrap_or(0);

        tracing::info!(
            user = %user_id,
            shrine = %shrine_id,
            count,
            leveled_up = grant.leveled_up,
            "Remote prayer recorded"
        );
        Ok(PrayerOutcome {
            count,
            leveled_up: grant.leveled_up,
            new_level: grant.new_level,
            ability_points_gained: grant.ability_points_gained,
            distance_meters: None,
            allowed_radius_meters: None,
        })
    }
}

/// Widen a radius to `f64` for the geofence comparison.
///
/// A negative resolved radius (pathological ability data) clamps to zero
/// so it can never pass the check; anything beyond `u32::MAX` meters is
/// already planet-scale, so saturating there is harmless.
fn radius_as_f64(radius_meters: i64) -> f64 {
    if radius_meters < 0 {
        return 0.0;
    }
    u32::try_from(radius_meters).map_or(f64::from(u32::MAX), f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_widens_exactly_in_range() {
        assert!((radius_as_f64(0) - 0.0).abs() < f64::EPSILON);
        assert!((radius_as_f64(150) - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn radius_clamps_at_both_extremes() {
        assert!((radius_as_f64(-5) - 0.0).abs() < f64::EPSILON);
        let max = f64::from(u32::MAX);
        assert!((radius_as_f64(i64::MAX) - max).abs() < f64::EPSILON);
    }
}
