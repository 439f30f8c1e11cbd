//! Daily remote-worship quota tracking.
//!
//! The quota window is the server-local calendar day,
//! `[local midnight, next local midnight)`, converted to UTC for the
//! event query. There is no per-user timezone support.
//!
//! The quota check and the event append are two steps, not one atomic
//! unit: simultaneous requests racing the last quota slot can overshoot
//! by the number of in-flight requests. Each day the window restarts
//! from the persisted events, so the overshoot never compounds.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use sanpai_db::QuotaStore;
use sanpai_types::UserId;

use crate::error::CoreError;

/// UTC bounds of one server-local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// Inclusive start (local midnight).
    pub start: DateTime<Utc>,
    /// Exclusive end (next local midnight).
    pub end: DateTime<Utc>,
}

/// Compute the UTC bounds of a server-local calendar day.
///
/// Returns `None` only when the local timezone has no representable
/// midnight for the date (a DST pathology); callers treat that as a
/// configuration problem.
pub fn local_day_window(date: NaiveDate) -> Option<DayWindow> {
    let start_naive = date.and_hms_opt(0, 0, 0)?;
    let end_naive = date.succ_opt()?.and_hms_opt(0, 0, 0)?;

    let start = Local.from_local_datetime(&start_naive).earliest()?;
    let end = Local.from_local_datetime(&end_naive).earliest()?;

    Some(DayWindow {
        start: start.with_timezone(&Utc),
        end: end.with_timezone(&Utc),
    })
}

/// Counts a user's remote prayers within the current local day.
pub struct QuotaTracker<'a> {
    pool: &'a PgPool,
}

impl<'a> QuotaTracker<'a> {
    /// Create a tracker bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// How many remote prayers the user has made today (server-local).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if local midnight cannot be
    /// resolved, or a storage error.
    pub async fn remote_worships_today(&self, user_id: UserId) -> Result<i64, CoreError> {
        let today = Local::now().date_naive();
        let window = local_day_window(today).ok_or_else(|| {
            CoreError::Configuration(format!("no representable local midnight for {today}"))
        })?;

        let count = QuotaStore::new(self.pool)
            .count_in_window(user_id, window.start, window.end)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn window_spans_twenty_four_hours() {
        // Away from DST transitions the window is exactly one day long.
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap_or_default();
        let window = local_day_window(date);
        let window = window.unwrap_or(DayWindow {
            start: Utc::now(),
            end: Utc::now(),
        });
        assert_eq!(window.end - window.start, TimeDelta::hours(24));
    }

    #[test]
    fn todays_window_contains_now() {
        let now_local = Local::now();
        let window = local_day_window(now_local.date_naive());
        let window = window.unwrap_or(DayWindow {
            start: Utc::now() + TimeDelta::days(1),
            end: Utc::now() + TimeDelta::days(1),
        });
        let now_utc = now_local.with_timezone(&Utc);
        assert!(window.start <= now_utc);
        assert!(now_utc < window.end);
    }

    #[test]
    fn consecutive_days_abut_exactly() {
        let d1 = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap_or_default();
        let d2 = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap_or_default();
        let w1 = local_day_window(d1);
        let w2 = local_day_window(d2);
        match (w1, w2) {
            (Some(a), Some(b)) => assert_eq!(a.end, b.start),
            _ => assert!(w1.is_some() && w2.is_some(), "windows must resolve"),
        }
    }
}
