//! Expiration policies: when a tracked value goes stale and what it resets to.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Extension points of a [`BaseTracker`](crate::BaseTracker).
///
/// All methods are pure: no I/O, no interior state. The tracker performs the
/// writes; the policy only decides what to write and when.
pub trait TrackerPolicy<T>: Send + Sync {
    /// Returns `true` if a value last reset at `last` is stale at `now`.
    fn is_expired(&self, now: DateTime<Utc>, last: DateTime<Utc>) -> bool;

    /// The value written by a reset at `now`.
    fn reset_value(&self, now: DateTime<Utc>) -> T;

    /// The timestamp recorded by a reset at `now`.
    fn reset_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now
    }

    /// The value reported while nothing is stored.
    fn fallback_value(&self) -> T;
}

/// Counter policy with a fixed time-to-live.
///
/// A value reset at `t0` is fresh for `now` in `[t0, t0 + ttl)` and stale
/// from `t0 + ttl` on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl TtlPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TrackerPolicy<i64> for TtlPolicy {
    fn is_expired(&self, now: DateTime<Utc>, last: DateTime<Utc>) -> bool {
        now - last >= self.ttl
    }

    fn reset_value(&self, _now: DateTime<Utc>) -> i64 {
        0
    }

    fn fallback_value(&self) -> i64 {
        0
    }
}

/// Calendar-aligned tracking periods, all in UTC.
///
/// Sub-day periods are aligned to the UNIX epoch, so `Minutes15` buckets
/// start at :00, :15, :30 and :45. Weeks start on Monday at midnight, months
/// on the first at midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPeriod {
    Seconds10,
    Seconds30,
    Minutes1,
    Minutes5,
    Minutes15,
    Minutes30,
    Hourly,
    Hours6,
    Hours12,
    Daily,
    Weekly,
    Monthly,
}

impl TrackerPeriod {
    /// Length of the period, or `None` for months.
    pub fn fixed_length(self) -> Option<Duration> {
        let length = match self {
            Self::Seconds10 => Duration::seconds(10),
            Self::Seconds30 => Duration::seconds(30),
            Self::Minutes1 => Duration::minutes(1),
            Self::Minutes5 => Duration::minutes(5),
            Self::Minutes15 => Duration::minutes(15),
            Self::Minutes30 => Duration::minutes(30),
            Self::Hourly => Duration::hours(1),
            Self::Hours6 => Duration::hours(6),
            Self::Hours12 => Duration::hours(12),
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::weeks(1),
            Self::Monthly => return None,
        };
        Some(length)
    }

    /// Start of the period containing `at`.
    pub fn start_of(self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Weekly => {
                let monday = at.date_naive()
                    - Duration::days(i64::from(at.weekday().num_days_from_monday()));
                midnight(monday).unwrap_or(at)
            }
            Self::Monthly => NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
                .and_then(midnight)
                .unwrap_or(at),
            fixed => {
                let Some(length) = fixed.fixed_length() else {
                    return at;
                };
                let step = length.num_milliseconds();
                let ms = at.timestamp_millis();
                DateTime::from_timestamp_millis(ms - ms.rem_euclid(step)).unwrap_or(at)
            }
        }
    }

    /// Start of the period after the one containing `at`.
    pub fn next_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.start_of(at);
        match self.fixed_length() {
            Some(length) => start + length,
            None => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(midnight)
                    .unwrap_or(start)
            }
        }
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Counter policy that resets at every [`TrackerPeriod`] boundary.
///
/// The recorded timestamp is the aligned start of the period, not the
/// instant of the reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodPolicy {
    period: TrackerPeriod,
}

impl PeriodPolicy {
    pub fn new(period: TrackerPeriod) -> Self {
        Self { period }
    }

    pub fn period(&self) -> TrackerPeriod {
        self.period
    }
}

impl TrackerPolicy<i64> for PeriodPolicy {
    fn is_expired(&self, now: DateTime<Utc>, last: DateTime<Utc>) -> bool {
        self.period.start_of(now) > last
    }

    fn reset_value(&self, _now: DateTime<Utc>) -> i64 {
        0
    }

    fn reset_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.period.start_of(now)
    }

    fn fallback_value(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn ttl_window_is_half_open() {
        let policy = TtlPolicy::new(Duration::seconds(60));
        let t0 = at(2024, 1, 1, 0, 0, 0);
        assert!(!policy.is_expired(t0, t0));
        assert!(!policy.is_expired(t0 + Duration::milliseconds(59_999), t0));
        assert!(policy.is_expired(t0 + Duration::seconds(60), t0));
        assert!(policy.is_expired(t0 + Duration::days(3), t0));
    }

    #[test]
    fn fixed_periods_align_to_epoch() {
        let t = at(2024, 3, 10, 14, 37, 42);
        assert_eq!(TrackerPeriod::Minutes15.start_of(t), at(2024, 3, 10, 14, 30, 0));
        assert_eq!(TrackerPeriod::Hourly.start_of(t), at(2024, 3, 10, 14, 0, 0));
        assert_eq!(TrackerPeriod::Hours6.start_of(t), at(2024, 3, 10, 12, 0, 0));
        assert_eq!(TrackerPeriod::Daily.start_of(t), at(2024, 3, 10, 0, 0, 0));
        assert_eq!(TrackerPeriod::Seconds30.start_of(t), at(2024, 3, 10, 14, 37, 30));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-03-10 is a Sunday.
        let t = at(2024, 3, 10, 23, 0, 0);
        assert_eq!(TrackerPeriod::Weekly.start_of(t), at(2024, 3, 4, 0, 0, 0));
        assert_eq!(TrackerPeriod::Weekly.next_start(t), at(2024, 3, 11, 0, 0, 0));
    }

    #[test]
    fn months_roll_over_the_year() {
        let t = at(2024, 12, 31, 12, 0, 0);
        assert_eq!(TrackerPeriod::Monthly.start_of(t), at(2024, 12, 1, 0, 0, 0));
        assert_eq!(TrackerPeriod::Monthly.next_start(t), at(2025, 1, 1, 0, 0, 0));
        assert!(TrackerPeriod::Monthly.fixed_length().is_none());
    }

    #[test]
    fn next_start_is_one_period_later() {
        let t = at(2024, 3, 10, 14, 37, 42);
        assert_eq!(TrackerPeriod::Hourly.next_start(t), at(2024, 3, 10, 15, 0, 0));
        assert_eq!(TrackerPeriod::Daily.next_start(t), at(2024, 3, 11, 0, 0, 0));
    }

    #[test]
    fn period_policy_expires_at_boundary() {
        let policy = PeriodPolicy::new(TrackerPeriod::Hourly);
        let now = at(2024, 3, 10, 14, 5, 0);
        let stamp = policy.reset_timestamp(now);
        assert_eq!(stamp, at(2024, 3, 10, 14, 0, 0));
        assert!(!policy.is_expired(at(2024, 3, 10, 14, 59, 59), stamp));
        assert!(policy.is_expired(at(2024, 3, 10, 15, 0, 0), stamp));
    }

    #[test]
    fn period_serde_names() {
        let json = serde_json::to_string(&TrackerPeriod::Minutes15).unwrap();
        assert_eq!(json, "\"minutes15\"");
        let back: TrackerPeriod = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(back, TrackerPeriod::Weekly);
    }
}
