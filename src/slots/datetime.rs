//! Date and time-of-day extraction.
//!
//! Relative words resolve against the caller's "now" in the caller's zone.
//! Results are local wall times; the zone travels separately as a tool
//! argument.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use chrono_tz::Tz;
use regex::Regex;

use super::{first_match, Rule};
use crate::config::SchedulingConfig;
use crate::intent::contains_bounded;

/// Wire format for event times.
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static CLOCK_12_MINUTES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):([0-5]\d)\s*([ap])\.?m\b").ok());
static CLOCK_12: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s*([ap])\.?m\b").ok());
static CLOCK_24: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").ok());
static AT_HOUR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bat\s+(\d{1,2})\b").ok());
static ISO_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").ok());
static WEEKDAY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(?:(next|this|on)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .ok()
});
static RELATIVE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\bin\s+(\d{1,4}|an?|one)\s+(minute|min|hour|hr|day|week)s?\b").ok()
});
static CLOCK_RANGE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?::([0-5]\d))?\s*(?:([ap])\.?m\b\.?)?\s*(?:-|to|until|till)\s*(\d{1,2})(?::([0-5]\d))?\s*(?:([ap])\.?m\b)?",
    )
    .ok()
});

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

fn to_24h(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    match (meridiem, hour) {
        ("a", 12) => Some(0),
        ("a", h) => Some(h),
        ("p", 12) => Some(12),
        ("p", h) => h.checked_add(12),
        _ => None,
    }
}

fn clock_12_minutes(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_12_MINUTES.as_ref()?.captures(text)?;
    let hour = to_24h(caps[1].parse().ok()?, &caps[3])?;
    NaiveTime::from_hms_opt(hour, caps[2].parse().ok()?, 0)
}

fn clock_12(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_12.as_ref()?.captures(text)?;
    let hour = to_24h(caps[1].parse().ok()?, &caps[2])?;
    NaiveTime::from_hms_opt(hour, 0, 0)
}

fn clock_24(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_24.as_ref()?.captures(text)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)
}

fn day_part(text: &str) -> Option<NaiveTime> {
    const PARTS: [(&str, u32); 6] = [
        ("noon", 12),
        ("midnight", 0),
        ("tonight", 20),
        ("evening", 18),
        ("afternoon", 15),
        ("morning", 9),
    ];
    PARTS
        .iter()
        .find(|(word, _)| contains_bounded(text, word, true))
        .and_then(|&(_, hour)| NaiveTime::from_hms_opt(hour, 0, 0))
}

/// "at 3" with no meridiem: 1-7 read as afternoon, the rest as written.
fn at_hour(text: &str) -> Option<NaiveTime> {
    let caps = AT_HOUR.as_ref()?.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let hour = match hour {
        1..=7 => hour.checked_add(12)?,
        8..=23 => hour,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}

fn other_meridiem(meridiem: &str) -> &'static str {
    if meridiem == "a" {
        "p"
    } else {
        "a"
    }
}

fn clock(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// A "2pm to 4pm" / "10-11am" / "9:30-10:15" range as (start, end).
///
/// A side without a meridiem borrows the other side's, flipping it when that
/// would put the end at or before the start. At least one side must carry a
/// meridiem or minutes. ISO dates are blanked first so "2024-01-05" never
/// reads as a range.
fn clock_range(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let text = ISO_DATE.as_ref()?.replace_all(text, " ");
    let caps = CLOCK_RANGE.as_ref()?.captures(&text)?;
    let minutes = |i: usize| -> Option<u32> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let (h1, m1) = (caps[1].parse::<u32>().ok()?, minutes(2)?);
    let (h2, m2) = (caps[4].parse::<u32>().ok()?, minutes(5)?);
    let mer1 = caps.get(3).map(|m| m.as_str());
    let mer2 = caps.get(6).map(|m| m.as_str());
    let has_minutes = caps.get(2).is_some() || caps.get(5).is_some();

    let (start, end) = match (mer1, mer2) {
        (Some(a), Some(b)) => (clock(to_24h(h1, a)?, m1)?, clock(to_24h(h2, b)?, m2)?),
        (None, Some(b)) => {
            let end = clock(to_24h(h2, b)?, m2)?;
            let start = clock(to_24h(h1, b)?, m1)?;
            if start < end {
                (start, end)
            } else {
                (clock(to_24h(h1, other_meridiem(b))?, m1)?, end)
            }
        }
        (Some(a), None) => {
            let start = clock(to_24h(h1, a)?, m1)?;
            let end = clock(to_24h(h2, a)?, m2)?;
            if end > start {
                (start, end)
            } else {
                (start, clock(to_24h(h2, other_meridiem(a))?, m2)?)
            }
        }
        (None, None) if has_minutes => (clock(h1, m1)?, clock(h2, m2)?),
        (None, None) => return None,
    };
    (end > start).then_some((start, end))
}

fn range_start(text: &str) -> Option<NaiveTime> {
    clock_range(text).map(|(start, _)| start)
}

const TIME_RULES: [Rule<NaiveTime>; 6] = [
    range_start,
    clock_12_minutes,
    clock_12,
    clock_24,
    day_part,
    at_hour,
];

/// Time of day mentioned in `text`, if any.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    first_match(&text.to_lowercase(), &TIME_RULES)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

type DateRule = fn(&str, NaiveDate) -> Option<NaiveDate>;

fn day_after_tomorrow(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    text.contains("day after tomorrow")
        .then(|| today.checked_add_days(Days::new(2)))
        .flatten()
}

fn tomorrow(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    contains_bounded(text, "tomorrow", true)
        .then(|| today.checked_add_days(Days::new(1)))
        .flatten()
}

fn today_words(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    ["today", "tonight", "this morning", "this afternoon", "this evening"]
        .iter()
        .any(|w| contains_bounded(text, w, true))
        .then_some(today)
}

fn iso_date(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    let caps = ISO_DATE.as_ref()?.captures(text)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

/// Next occurrence of a named weekday. "this friday" may be today; a bare or
/// "next" weekday is always in the future.
fn weekday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = WEEKDAY.as_ref()?.captures(text)?;
    let target: Weekday = caps[2].parse().ok()?;
    let first = if caps.get(1).is_some_and(|m| m.as_str() == "this") {
        0
    } else {
        1
    };
    (first..=7).find_map(|offset| {
        today
            .checked_add_days(Days::new(offset))
            .filter(|d| d.weekday() == target)
    })
}

const DATE_RULES: [DateRule; 5] = [day_after_tomorrow, tomorrow, today_words, iso_date, weekday];

/// Calendar date mentioned in `text`, relative to `today`.
pub fn extract_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lowered = text.to_lowercase();
    DATE_RULES.iter().find_map(|rule| rule(&lowered, today))
}

// ---------------------------------------------------------------------------
// Relative offsets
// ---------------------------------------------------------------------------

/// "in 30 minutes", "in an hour", "in 3 days" relative to `now`.
pub fn extract_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lowered = text.to_lowercase();
    let caps = RELATIVE.as_ref()?.captures(&lowered)?;
    let amount: i64 = match &caps[1] {
        "a" | "an" | "one" => 1,
        n => n.parse().ok()?,
    };
    let delta = match &caps[2] {
        "minute" | "min" => TimeDelta::try_minutes(amount)?,
        "hour" | "hr" => TimeDelta::try_hours(amount)?,
        "day" => TimeDelta::try_days(amount)?,
        "week" => TimeDelta::try_weeks(amount)?,
        _ => return None,
    };
    now.checked_add_signed(delta)?.with_second(0)?.with_nanosecond(0)
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

/// Resolve a start instant (local wall time) from `text`.
///
/// - relative offsets win outright;
/// - a date and a time combine;
/// - a time alone means today, or tomorrow if it has already passed;
/// - a date alone uses the configured default hour.
///
/// Returns `None` when nothing parses.
pub fn extract_datetime(
    text: &str,
    now: DateTime<Tz>,
    scheduling: &SchedulingConfig,
) -> Option<NaiveDateTime> {
    let now_local = now.naive_local();
    if let Some(at) = extract_relative(text, now_local) {
        return Some(at);
    }

    let date = extract_date(text, now_local.date());
    let time = extract_time(text);
    match (date, time) {
        (Some(day), Some(time)) => Some(day.and_time(time)),
        (None, Some(time)) => {
            let today = now_local.date().and_time(time);
            if today < now_local {
                today.checked_add_days(Days::new(1))
            } else {
                Some(today)
            }
        }
        (Some(day), None) => day.and_hms_opt(scheduling.default_hour.min(23), 0, 0),
        (None, None) => None,
    }
}

/// End of a "2pm to 4pm" / "10-11am" range, on the start's date.
///
/// Ends not after `start` are rejected.
pub fn extract_range_end(text: &str, start: NaiveDateTime) -> Option<NaiveDateTime> {
    let (_, end) = clock_range(&text.to_lowercase())?;
    let end = start.date().and_time(end);
    (end > start).then_some(end)
}

/// Start used when nothing was extracted: tomorrow at the default hour.
pub fn fallback_start(now: DateTime<Tz>, scheduling: &SchedulingConfig) -> Option<NaiveDateTime> {
    now.date_naive()
        .checked_add_days(Days::new(1))?
        .and_hms_opt(scheduling.default_hour.min(23), 0, 0)
}

/// `start` plus the default event length.
pub fn default_end(start: NaiveDateTime, scheduling: &SchedulingConfig) -> Option<NaiveDateTime> {
    start.checked_add_signed(TimeDelta::try_minutes(i64::from(
        scheduling.default_event_minutes,
    ))?)
}

/// Render a local wall time in the tool wire format.
pub fn format_local(at: NaiveDateTime) -> String {
    at.format(LOCAL_FORMAT).to_string()
}
