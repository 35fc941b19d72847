//! Local calendar-day arithmetic.
//!
//! Timestamps are stored in UTC. Business rules that talk about "today" (the
//! duplicate-submission window, dashboard counts, audit listings) use the
//! calendar day of the configured named time zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// The local calendar date of `instant` in `tz`.
#[must_use]
pub fn local_date(tz: Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Start of the local day containing `instant`, expressed in UTC.
#[must_use]
pub fn local_day_start(tz: Tz, instant: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(tz, local_date(tz, instant))
}

/// Half-open UTC range `[start, end)` covering the local calendar day `date`.
#[must_use]
pub fn local_day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(tz, date);
    let end = date
        .succ_opt()
        .map_or_else(|| start + Duration::days(1), |next| local_midnight(tz, next));
    (start, end)
}

/// Formats a UTC instant in the local zone with the given `strftime` pattern.
#[must_use]
pub fn format_local(tz: Tz, instant: DateTime<Utc>, pattern: &str) -> String {
    instant.with_timezone(&tz).format(pattern).to_string()
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = NaiveDateTime::new(date, chrono::NaiveTime::default());
    // A DST gap at midnight has no local instant; fall back to reading it as UTC.
    tz.from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono_tz::Asia::Taipei;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_day_start_before_local_midnight() {
        // 2024-03-10 15:30 UTC is 23:30 in Taipei
        let start = local_day_start(Taipei, utc(2024, 3, 10, 15, 30));
        assert_eq!(start, utc(2024, 3, 9, 16, 0));
    }

    #[test]
    fn test_day_start_after_local_midnight() {
        // 2024-03-10 16:30 UTC is 00:30 on the 11th in Taipei
        let start = local_day_start(Taipei, utc(2024, 3, 10, 16, 30));
        assert_eq!(start, utc(2024, 3, 10, 16, 0));
    }

    #[test]
    fn test_day_bounds_cover_24_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let (start, end) = local_day_bounds(Taipei, date);
        assert_eq!(start, utc(2024, 3, 10, 16, 0));
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_day_bounds_follow_dst() {
        // US spring-forward day is 23 hours long
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = local_day_bounds(chrono_tz::America::New_York, date);
        assert_eq!(end - start, Duration::hours(23));
    }

    #[test]
    fn test_format_local() {
        let formatted = format_local(Taipei, utc(2024, 12, 31, 20, 5), "%Y/%m/%d %H:%M");
        assert_eq!(formatted, "2025/01/01 04:05");
    }
}
