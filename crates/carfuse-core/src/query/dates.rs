//! Date filter parsing and relative-date buckets

use std::sync::Arc;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc,
};

/// Storage format of every timestamp in the audit store
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fallback formats tried in order after the flexible parser fails.
/// The flag marks date-only formats.
const FALLBACK_FORMATS: [(&str, bool); 4] = [
    ("%Y-%m-%d", true),
    ("%Y-%m-%d %H:%M:%S", false),
    ("%Y/%m/%d", true),
    ("%Y/%m/%d %H:%M:%S", false),
];

/// Longest accepted `last_N_days` window
const MAX_RELATIVE_DAYS: i64 = 366;

/// Source of "now" for relative dates
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock, UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Which end of a range a date filter describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBoundary {
    Start,
    End,
}

/// Inclusive timestamp range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59 always exists
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(date))
}

/// Flexible parse: RFC 3339, ISO-8601 with `T`, RFC 2822.
/// Returns the timestamp and whether the input carried a time component.
fn parse_flexible(value: &str) -> Option<(NaiveDateTime, bool)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some((dt.with_timezone(&Utc).naive_utc(), true));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some((dt, true));
        }
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| (dt.with_timezone(&Utc).naive_utc(), true))
}

fn parse_fallback(value: &str) -> Option<(NaiveDateTime, bool)> {
    FALLBACK_FORMATS.iter().find_map(|(fmt, date_only)| {
        if *date_only {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .map(|d| (start_of_day(d), false))
        } else {
            NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|dt| (dt, true))
        }
    })
}

/// Parse a `start_date`/`end_date` value.
///
/// Date-only end values become 23:59:59 of that day. `None` means the value
/// should be dropped from the filter.
pub fn parse_date_filter(value: &str, boundary: DateBoundary) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (parsed, has_time) = parse_flexible(value).or_else(|| parse_fallback(value))?;
    match boundary {
        DateBoundary::End if !has_time => Some(end_of_day(parsed.date())),
        _ => Some(parsed),
    }
}

fn days_ago(now: NaiveDateTime, days: i64) -> Option<DateRange> {
    let start = now.checked_sub_signed(Duration::try_days(days)?)?;
    Some(DateRange { start, end: now })
}

/// Resolve a relative-date keyword against `now`.
///
/// Unknown keywords and `last_N_days` outside `1..=366` resolve to `None`.
pub fn resolve_relative_date(keyword: &str, now: NaiveDateTime) -> Option<DateRange> {
    let today = now.date();
    let range = match keyword {
        "today" => DateRange {
            start: start_of_day(today),
            end: now,
        },
        "yesterday" => {
            let day = today.pred_opt()?;
            DateRange {
                start: start_of_day(day),
                end: end_of_day(day),
            }
        }
        "this_week" => {
            let monday = today.checked_sub_signed(Duration::try_days(i64::from(
                today.weekday().num_days_from_monday(),
            ))?)?;
            DateRange {
                start: start_of_day(monday),
                end: now,
            }
        }
        "last_week" => {
            let this_monday = today.checked_sub_signed(Duration::try_days(i64::from(
                today.weekday().num_days_from_monday(),
            ))?)?;
            let monday = this_monday.checked_sub_signed(Duration::try_days(7)?)?;
            let sunday = this_monday.pred_opt()?;
            DateRange {
                start: start_of_day(monday),
                end: end_of_day(sunday),
            }
        }
        "this_month" => DateRange {
            start: start_of_day(today.with_day(1)?),
            end: now,
        },
        "last_month" => {
            let first_this = today.with_day(1)?;
            let first_last = first_this.checked_sub_months(Months::new(1))?;
            DateRange {
                start: start_of_day(first_last),
                end: end_of_day(first_this.pred_opt()?),
            }
        }
        "last_24_hours" => DateRange {
            start: now.checked_sub_signed(Duration::try_hours(24)?)?,
            end: now,
        },
        "last_7_days" => return days_ago(now, 7),
        "last_30_days" => return days_ago(now, 30),
        "last_90_days" => return days_ago(now, 90),
        other => {
            let digits = other.strip_prefix("last_")?.strip_suffix("_days")?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let days: i64 = digits.parse().ok()?;
            if !(1..=MAX_RELATIVE_DAYS).contains(&days) {
                return None;
            }
            return days_ago(now, days);
        }
    };
    Some(range)
}
