//! Time source and day-boundary arithmetic.
//!
//! Everything that depends on "now" or on the local calendar goes through a
//! [`Clock`]: the manager never reads the system time directly, so tests can
//! pin both the instant and the zone.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::error::{Error, Result};

/// Milliseconds in one (absolute, 24h) day
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Source of the current instant, expressed in the user's zone
pub trait Clock {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the machine's local zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = chrono::Local;

    fn now(&self) -> DateTime<chrono::Local> {
        chrono::Local::now()
    }
}

/// Clock frozen at one instant and offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Parse an RFC 3339 timestamp; the offset becomes the clock's zone
    pub fn parse(value: &str) -> Result<Self> {
        let now = DateTime::parse_from_rfc3339(value.trim()).map_err(|err| {
            Error::InvalidArgument(format!("invalid --now timestamp '{value}': {err}"))
        })?;
        Ok(Self::new(now))
    }

    pub fn set(&mut self, now: DateTime<FixedOffset>) {
        self.now = now;
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    type Tz = FixedOffset;

    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

/// The half-open interval `[start, end)` that counts as "today".
///
/// `start` is local midnight of the current day; `end` is exactly 24h
/// later, even across a DST change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        let start = resolve_local(&now.timezone(), midnight).with_timezone(&Utc);
        Self {
            start,
            end: start + Duration::milliseconds(DAY_MS),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Map a local wall-clock time to an instant in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap move forward by one hour.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    #[test]
    fn window_starts_at_local_midnight() {
        let now = at("2025-03-10T15:45:00+02:00");
        let window = DayWindow::containing(&now);

        assert_eq!(window.start, at("2025-03-10T00:00:00+02:00"));
        assert_eq!(window.end, at("2025-03-11T00:00:00+02:00"));
    }

    #[test]
    fn window_uses_local_date_not_utc_date() {
        // 01:30 local is still the previous day in UTC.
        let now = at("2025-03-10T01:30:00+05:00");
        let window = DayWindow::containing(&now);

        assert_eq!(window.start.to_rfc3339(), "2025-03-09T19:00:00+00:00");
        assert!(window.contains(now.with_timezone(&Utc)));
        assert!(!window.contains(window.end));
        assert!(window.contains(window.start));
    }

    fn berlin(date: (i32, u32, u32), time: (u32, u32)) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(time.0, time.1, 0)
            .unwrap()
    }

    #[test]
    fn gap_time_moves_forward_an_hour() {
        let spring = resolve_local(&chrono_tz::Europe::Berlin, berlin((2025, 3, 30), (2, 30)));
        assert_eq!(spring.to_rfc3339(), "2025-03-30T03:30:00+02:00");
    }

    #[test]
    fn repeated_time_takes_earlier_instant() {
        let autumn = resolve_local(&chrono_tz::Europe::Berlin, berlin((2025, 10, 26), (2, 30)));
        assert_eq!(autumn.to_rfc3339(), "2025-10-26T02:30:00+02:00");
        assert_eq!(autumn, at("2025-10-26T00:30:00Z"));
    }

    #[test]
    fn window_on_spring_forward_day_is_24h_from_midnight() {
        let now = at("2025-03-30T12:00:00+02:00").with_timezone(&chrono_tz::Europe::Berlin);
        let window = DayWindow::containing(&now);

        assert_eq!(window.start, at("2025-03-30T00:00:00+01:00"));
        assert_eq!(window.end, at("2025-03-31T00:00:00+01:00"));
        assert!(window.contains(at("2025-03-30T23:30:00+02:00").with_timezone(&Utc)));
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = FixedClock::parse("2025-01-01T08:00:00Z").unwrap();
        clock.advance(Duration::days(2));
        assert_eq!(clock.now_utc(), at("2025-01-03T08:00:00Z"));

        clock.set(at("2024-12-31T23:00:00-01:00"));
        assert_eq!(clock.now_utc(), at("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn fixed_clock_rejects_garbage() {
        let err = FixedClock::parse("yesterday").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
