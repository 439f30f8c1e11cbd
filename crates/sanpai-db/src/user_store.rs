//! User lookups and the transactional experience grant.
//!
//! The experience grant is the one place user progression state mutates
//! outside of ability purchases, and it must never lose an update under
//! concurrent prayers. The user row is locked with `SELECT ... FOR UPDATE`
//! for the duration of the transaction, so concurrent grants to the same
//! user serialize while grants to different users proceed independently.

use sqlx::PgPool;
use uuid::Uuid;

use sanpai_progression::{GrantOutcome, ProgressionError, apply_experience};
use sanpai_types::{LevelTier, User, UserId};

use crate::error::DbError;

/// Operations on the `users` and `level_tiers` tables.
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    /// Create a new user store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UserNotFound`] if no row exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT id, name, level, exp, ability_points, created_at
              FROM users
              WHERE id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        Ok(row.into_user())
    }

    /// Fetch the level tier for an exact level.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingLevelTier`] if no row exists -- a fatal
    /// reference-data problem, logged as an operational error.
    pub async fn get_tier(&self, level: i64) -> Result<LevelTier, DbError> {
        self.get_tier_opt(level).await?.ok_or_else(|| {
            tracing::error!(level, "level tier table has no row for a live level");
            DbError::MissingLevelTier { level }
        })
    }

    /// Fetch the level tier for a level, or `None` past the table's top.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_tier_opt(&self, level: i64) -> Result<Option<LevelTier>, DbError> {
        let row = sqlx::query_as::<_, TierRow>(
            r"SELECT level, required_exp, pray_distance, worship_count
              FROM level_tiers
              WHERE level = $1",
        )
        .bind(level)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(TierRow::into_tier))
    }

    /// Atomically grant experience to a user.
    ///
    /// One transaction: lock the user row, look up the current and next
    /// level tiers, recompute level/points via the rules layer, persist.
    /// The current tier must exist; its absence aborts the enclosing
    /// operation with nothing committed.
    ///
    /// A grant advances the user by at most one level per call (the
    /// documented single-step behavior of
    /// [`apply_experience`]).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UserNotFound`], [`DbError::MissingLevelTier`],
    /// [`DbError::Rules`] for a negative amount or overflow, or
    /// [`DbError::Postgres`] if any statement fails.
    pub async fn grant_experience(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> Result<GrantOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserRow>(
            r"SELECT id, name, level, exp, ability_points, created_at
              FROM users
              WHERE id = $1
              FOR UPDATE",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        // The current tier must exist even though the grant math only
        // needs the next one: a user on an unknown level means broken
        // reference data and the whole prayer must abort.
        let current_tier = sqlx::query_as::<_, TierRow>(
            r"SELECT level, required_exp, pray_distance, worship_count
              FROM level_tiers WHERE level = $1",
        )
        .bind(user.level)
        .fetch_optional(&mut *tx)
        .await?;
        if current_tier.is_none() {
            tracing::error!(
                level = user.level,
                user = %user_id,
                "level tier table has no row for a live level"
            );
            return Err(DbError::MissingLevelTier { level: user.level });
        }

        let next_level = user
            .level
            .checked_add(1)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!("level {} + 1", user.level),
            })
            .map_err(DbError::Rules)?;
        let next_tier = sqlx::query_as::<_, TierRow>(
            r"SELECT level, required_exp, pray_distance, worship_count
              FROM level_tiers WHERE level = $1",
        )
        .bind(next_level)
        .fetch_optional(&mut *tx)
        .await?
        .map(TierRow::into_tier);

        let outcome = apply_experience(user.level, user.exp, amount, next_tier.as_ref())?;

        let new_points = user
            .ability_points
            .checked_add(outcome.ability_points_gained)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: format!(
                    "ability points {} + {}",
                    user.ability_points, outcome.ability_points_gained
                ),
            })
            .map_err(DbError::Rules)?;

        sqlx::query(
            r"UPDATE users
              SET level = $2, exp = $3, ability_points = $4
              WHERE id = $1",
        )
        .bind(user_id.into_inner())
        .bind(outcome.new_level)
        .bind(outcome.new_exp)
        .bind(new_points)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            user = %user_id,
            amount,
            new_level = outcome.new_level,
            leveled_up = outcome.leveled_up,
            "Experience granted"
        );
        Ok(outcome)
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    /// User UUID.
    id: Uuid,
    /// Display name.
    name: String,
    /// Current level.
    level: i64,
    /// Accumulated experience.
    exp: i64,
    /// Unspent ability points.
    ability_points: i64,
    /// Registration timestamp.
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    /// Convert to the domain [`User`] type.
    fn into_user(self) -> User {
        User {
            id: UserId::from(self.id),
            name: self.name,
            level: self.level,
            exp: self.exp,
            ability_points: self.ability_points,
            created_at: self.created_at,
        }
    }
}

/// A row from the `level_tiers` table.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct TierRow {
    /// The level this row describes.
    level: i64,
    /// Total experience required to hold this level.
    required_exp: i64,
    /// Base pray radius in meters.
    pray_distance: i64,
    /// Base daily worship quota.
    worship_count: i64,
}

impl TierRow {
    /// Convert to the domain [`LevelTier`] type.
    const fn into_tier(self) -> LevelTier {
        LevelTier {
            level: self.level,
            required_exp: self.required_exp,
            pray_distance: self.pray_distance,
            worship_count: self.worship_count,
        }
    }
}
