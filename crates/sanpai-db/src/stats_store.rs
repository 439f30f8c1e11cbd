//! Prayer statistics: four period ledgers per target kind.
//!
//! Every prayer increments a counter in all four period tables for its
//! target kind -- all-time, yearly, monthly, weekly -- and a physical
//! prayer does so once for the shrine and once per enshrined deity.
//!
//! Each increment is a single atomic upsert
//! (`INSERT ... ON CONFLICT ... DO UPDATE SET count = count + 1`) backed
//! by a uniqueness constraint, so concurrent prayers for the same
//! (target, user) pair can neither produce duplicate rows nor lose an
//! update. The fan-out across the four tables (and across deities) is
//! deliberately *not* one transaction: each row is individually
//! consistent, and a crash mid-fan-out leaves some ledgers one count
//! behind rather than holding long multi-table transactions on hot
//! shrine rows.
//!
//! `rank` is a placeholder column owned by an external ranking job; this
//! store only ever writes its default.

use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use sanpai_types::{PrayerTarget, StatPeriod, UserId};

use crate::error::DbError;

/// Calendar bucket keys for the periodic tables, derived from one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBuckets {
    /// Calendar year for the yearly and monthly tables.
    pub year: i32,
    /// Calendar month (1-12) for the monthly table.
    pub month: i32,
    /// ISO week-numbering year for the weekly table.
    pub iso_year: i32,
    /// ISO week (1-53) for the weekly table.
    pub iso_week: i32,
}

impl StatBuckets {
    /// Derive all bucket keys from a calendar date.
    ///
    /// The caller decides which timezone's "today" this is; the service
    /// uses the server-local date so the weekly bucket rolls over at the
    /// same midnight as the daily worship quota.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: date.year(),
            month: i32::try_from(date.month()).unwrap_or(0),
            iso_year: iso.year(),
            iso_week: i32::try_from(iso.week()).unwrap_or(0),
        }
    }
}

/// Operations on the eight prayer statistics tables.
pub struct StatsStore<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsStore<'a> {
    /// Create a new statistics store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record one prayer against a target in all four period tables.
    ///
    /// Four upserts, one per period table. Each is atomic on its own;
    /// see the module docs for the fan-out consistency trade-off.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on the first failing upsert; earlier
    /// upserts in the fan-out remain committed.
    pub async fn record_prayer(
        &self,
        target: PrayerTarget,
        target_id: Uuid,
        user_id: UserId,
        buckets: StatBuckets,
    ) -> Result<(), DbError> {
        for period in StatPeriod::ALL {
            self.upsert_one(target, period, target_id, user_id, buckets)
                .await?;
        }
        tracing::debug!(
            ?target,
            %target_id,
            user = %user_id,
            "Prayer recorded in all period tables"
        );
        Ok(())
    }

    /// Read one counter, or `None` if the user has never prayed to the
    /// target within the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_count(
        &self,
        target: PrayerTarget,
        period: StatPeriod,
        target_id: Uuid,
        user_id: UserId,
        buckets: StatBuckets,
    ) -> Result<Option<i64>, DbError> {
        let table = stat_table(target, period);
        let column = target_column(target);

        let query = match period {
            StatPeriod::AllTime => format!(
                "SELECT count FROM {table} WHERE {column} = $1 AND user_id = $2"
            ),
            StatPeriod::Yearly => format!(
                "SELECT count FROM {table} WHERE {column} = $1 AND user_id = $2 AND year = $3"
            ),
            StatPeriod::Monthly => format!(
                "SELECT count FROM {table}
                 WHERE {column} = $1 AND user_id = $2 AND year = $3 AND month = $4"
            ),
            StatPeriod::Weekly => format!(
                "SELECT count FROM {table}
                 WHERE {column} = $1 AND user_id = $2 AND iso_year = $3 AND iso_week = $4"
            ),
        };

        let mut q = sqlx::query_as::<_, (i64,)>(&query)
            .bind(target_id)
            .bind(user_id.into_inner());
        match period {
            StatPeriod::AllTime => {}
            StatPeriod::Yearly => {
                q = q.bind(buckets.year);
            }
            StatPeriod::Monthly => {
                q = q.bind(buckets.year).bind(buckets.month);
            }
            StatPeriod::Weekly => {
                q = q.bind(buckets.iso_year).bind(buckets.iso_week);
            }
        }

        let row = q.fetch_optional(self.pool).await?;
        Ok(row.map(|(count,)| count))
    }

    /// One atomic insert-or-increment against a single period table.
    async fn upsert_one(
        &self,
        target: PrayerTarget,
        period: StatPeriod,
        target_id: Uuid,
        user_id: UserId,
        buckets: StatBuckets,
    ) -> Result<(), DbError> {
        let table = stat_table(target, period);
        let column = target_column(target);

        let query = match period {
            StatPeriod::AllTime => format!(
                "INSERT INTO {table} ({column}, user_id, count, rank)
                 VALUES ($1, $2, 1, 1)
                 ON CONFLICT ({column}, user_id)
                 DO UPDATE SET count = {table}.count + 1"
            ),
            StatPeriod::Yearly => format!(
                "INSERT INTO {table} ({column}, user_id, year, count, rank)
                 VALUES ($1, $2, $3, 1, 1)
                 ON CONFLICT ({column}, user_id, year)
                 DO UPDATE SET count = {table}.count + 1"
            ),
            StatPeriod::Monthly => format!(
                "INSERT INTO {table} ({column}, user_id, year, month, count, rank)
                 VALUES ($1, $2, $3, $4, 1, 1)
                 ON CONFLICT ({column}, user_id, year, month)
                 DO UPDATE SET count = {table}.count + 1"
            ),
            StatPeriod::Weekly => format!(
                "INSERT INTO {table} ({column}, user_id, iso_year, iso_week, count, rank)
                 VALUES ($1, $2, $3, $4, 1, 1)
                 ON CONFLICT ({column}, user_id, iso_year, iso_week)
                 DO UPDATE SET count = {table}.count + 1"
            ),
        };

        let mut q = sqlx::query(&query).bind(target_id).bind(user_id.into_inner());
        match period {
            StatPeriod::AllTime => {}
            StatPeriod::Yearly => {
                q = q.bind(buckets.year);
            }
            StatPeriod::Monthly => {
                q = q.bind(buckets.year).bind(buckets.month);
            }
            StatPeriod::Weekly => {
                q = q.bind(buckets.iso_year).bind(buckets.iso_week);
            }
        }

        q.execute(self.pool).await?;
        Ok(())
    }
}

/// Table name for a (target kind, period) pair.
///
/// Identifiers are compile-time constants; only values are bound at
/// runtime.
const fn stat_table(target: PrayerTarget, period: StatPeriod) -> &'static str {
    match (target, period) {
        (PrayerTarget::Shrine, StatPeriod::AllTime) => "shrine_prayer_stats_all_time",
        (PrayerTarget::Shrine, StatPeriod::Yearly) => "shrine_prayer_stats_yearly",
        (PrayerTarget::Shrine, StatPeriod::Monthly) => "shrine_prayer_stats_monthly",
        (PrayerTarget::Shrine, StatPeriod::Weekly) => "shrine_prayer_stats_weekly",
        (PrayerTarget::Deity, StatPeriod::AllTime) => "deity_prayer_stats_all_time",
        (PrayerTarget::Deity, StatPeriod::Yearly) => "deity_prayer_stats_yearly",
        (PrayerTarget::Deity, StatPeriod::Monthly) => "deity_prayer_stats_monthly",
        (PrayerTarget::Deity, StatPeriod::Weekly) => "deity_prayer_stats_weekly",
    }
}

/// Target id column name for a target kind.
const fn target_column(target: PrayerTarget) -> &'static str {
    match target {
        PrayerTarget::Shrine => "shrine_id",
        PrayerTarget::Deity => "deity_id",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_from_midyear_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap_or_default();
        let b = StatBuckets::from_date(date);
        assert_eq!(b.year, 2026);
        assert_eq!(b.month, 8);
        assert_eq!(b.iso_year, 2026);
        // 2026-08-07 falls in ISO week 32.
        assert_eq!(b.iso_week, 32);
    }

    #[test]
    fn iso_year_differs_at_january_boundary() {
        // 2027-01-01 is a Friday belonging to ISO week 53 of 2026.
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap_or_default();
        let b = StatBuckets::from_date(date);
        assert_eq!(b.year, 2027);
        assert_eq!(b.iso_year, 2026);
        assert_eq!(b.iso_week, 53);
    }

    #[test]
    fn table_names_cover_all_pairs() {
        let mut names = std::collections::BTreeSet::new();
        for target in [PrayerTarget::Shrine, PrayerTarget::Deity] {
            for period in StatPeriod::ALL {
                names.insert(stat_table(target, period));
            }
        }
        assert_eq!(names.len(), 8, "every pair maps to a distinct table");
    }
}
