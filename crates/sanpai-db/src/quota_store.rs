//! Remote prayer events, the source of truth for the daily worship quota.
//!
//! Events are append-only rows, not an in-memory counter: the quota check
//! counts rows inside the current day window on every request, so worker
//! restarts and concurrent requests all see the same truth.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sanpai_types::{RemotePrayerEventId, ShrineId, UserId};

use crate::error::DbError;

/// Operations on the `remote_prayer_events` table.
pub struct QuotaStore<'a> {
    pool: &'a PgPool,
}

impl<'a> QuotaStore<'a> {
    /// Create a new quota store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one remote prayer event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn record_event(
        &self,
        shrine_id: ShrineId,
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO remote_prayer_events (id, shrine_id, user_id, occurred_at)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(RemotePrayerEventId::new().into_inner())
        .bind(shrine_id.into_inner())
        .bind(user_id.into_inner())
        .bind(occurred_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Count a user's remote prayer events in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_in_window(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as(
            r"SELECT COUNT(*)
              FROM remote_prayer_events
              WHERE user_id = $1 AND occurred_at >= $2 AND occurred_at < $3",
        )
        .bind(user_id.into_inner())
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
