use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike};
use chrono_tz::Tz;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Wall-clock fields of an instant inside a named timezone. Derived at the
/// calendar boundary, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRule {
    MonthlyByDay { day: u32, hour: u32, minute: u32 },
    IntervalDays { interval_days: i64, anchor_ms: i64 },
}

/// Zone-aware calendar calculator. Owns its fallback zone as an explicit
/// field; an unrecognized zone name resolves to the fallback rather than
/// failing, since alert correctness needs *a* consistent zone, not strict
/// validation.
#[derive(Debug, Clone, Copy)]
pub struct TimeZoneClock {
    fallback: Tz,
}

impl Default for TimeZoneClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeZoneClock {
    pub fn new() -> Self {
        Self { fallback: Tz::UTC }
    }

    pub fn with_fallback(fallback: Tz) -> Self {
        Self { fallback }
    }

    pub fn resolve_zone(&self, zone_name: &str) -> Tz {
        zone_name.trim().parse::<Tz>().unwrap_or(self.fallback)
    }

    pub fn resolve_calendar(&self, instant_ms: i64, zone_name: &str) -> CalendarParts {
        let zone = self.resolve_zone(zone_name);
        let utc = DateTime::from_timestamp_millis(instant_ms).unwrap_or(DateTime::UNIX_EPOCH);
        let local = utc.with_timezone(&zone);
        CalendarParts {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
        }
    }

    /// Maps civil fields back to an instant. A civil time can map to zero,
    /// one, or two instants across a DST transition, so this resolves the
    /// zone offset twice: once at the fields-read-as-UTC estimate, then again
    /// at the candidate instant that estimate produces. Real-world offsets
    /// move in steps far smaller than the first pass's error bound, so one
    /// redo is enough to converge. A nonexistent civil time (spring-forward
    /// gap) yields whichever instant the two passes settle on.
    pub fn zoned_to_instant(&self, parts: &CalendarParts, zone_name: &str) -> i64 {
        let zone = self.resolve_zone(zone_name);
        let naive = naive_from_parts(parts);

        let first_offset = offset_seconds(zone, &naive);
        let estimate_ms = naive.and_utc().timestamp_millis();
        let candidate_ms = estimate_ms - first_offset * 1_000;

        let candidate_naive = DateTime::from_timestamp_millis(candidate_ms)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .naive_utc();
        let second_offset = offset_seconds(zone, &candidate_naive);
        if second_offset == first_offset {
            candidate_ms
        } else {
            estimate_ms - second_offset * 1_000
        }
    }

    pub fn next_occurrence(&self, now_ms: i64, rule: RecurrenceRule, zone_name: &str) -> i64 {
        match rule {
            RecurrenceRule::MonthlyByDay { day, hour, minute } => {
                self.next_monthly_occurrence(now_ms, day, hour, minute, zone_name)
            }
            RecurrenceRule::IntervalDays {
                interval_days,
                anchor_ms,
            } => next_interval_occurrence(now_ms, interval_days, anchor_ms),
        }
    }

    /// Canonical monthly bucket (`YYYY-MM`) of an instant in the zone's
    /// local calendar.
    pub fn cycle_key(&self, instant_ms: i64, zone_name: &str) -> String {
        let parts = self.resolve_calendar(instant_ms, zone_name);
        format!("{:04}-{:02}", parts.year, parts.month)
    }

    fn next_monthly_occurrence(
        &self,
        now_ms: i64,
        day: u32,
        hour: u32,
        minute: u32,
        zone_name: &str,
    ) -> i64 {
        let now_parts = self.resolve_calendar(now_ms, zone_name);
        let scheduled = self.monthly_instant(now_parts.year, now_parts.month, day, hour, minute, zone_name);
        if scheduled >= now_ms {
            return scheduled;
        }

        let (next_year, next_month) = roll_month(now_parts.year, now_parts.month);
        self.monthly_instant(next_year, next_month, day, hour, minute, zone_name)
    }

    fn monthly_instant(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        zone_name: &str,
    ) -> i64 {
        let parts = CalendarParts {
            year,
            month,
            day: clamp_day_for_month(year, month, day),
            hour,
            minute,
            second: 0,
        };
        self.zoned_to_instant(&parts, zone_name)
    }
}

/// `min(day, daysInMonth)`, so "due on the 31st" degrades gracefully in
/// shorter months.
pub fn clamp_day_for_month(year: i32, month: u32, day: u32) -> u32 {
    day.max(1).min(days_in_month(year, month))
}

pub fn now_epoch_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => i64::try_from(duration.as_millis()).unwrap_or(0),
        Err(_) => 0,
    }
}

fn next_interval_occurrence(now_ms: i64, interval_days: i64, anchor_ms: i64) -> i64 {
    let interval_ms = interval_days.max(1) * MILLIS_PER_DAY;
    if anchor_ms >= now_ms {
        return anchor_ms;
    }
    let elapsed = now_ms - anchor_ms;
    anchor_ms + ((elapsed + interval_ms - 1) / interval_ms) * interval_ms
}

fn naive_from_parts(parts: &CalendarParts) -> NaiveDateTime {
    let month = parts.month.clamp(1, 12);
    let day = clamp_day_for_month(parts.year, month, parts.day);
    let date = NaiveDate::from_ymd_opt(parts.year, month, day)
        .unwrap_or(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN));
    date.and_hms_opt(
        parts.hour.min(23),
        parts.minute.min(59),
        parts.second.min(59),
    )
    .unwrap_or(date.and_time(chrono::NaiveTime::MIN))
}

fn offset_seconds(zone: Tz, utc_naive: &NaiveDateTime) -> i64 {
    i64::from(
        zone.offset_from_utc_datetime(utc_naive)
            .fix()
            .local_minus_utc(),
    )
}

fn roll_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
