//! Timezone resolution cascade.
//!
//! Order: explicit profile zone, OS-reported IANA name, the configured
//! UTC-offset table, then UTC. Each step that yields an unparseable name
//! falls through to the next, so resolution always produces a zone.

use std::collections::BTreeMap;

use chrono_tz::Tz;

/// Parse `"+05:30"`, `"-5:00"`, `"+0000"`, `"Z"` into seconds east of UTC.
pub fn parse_utc_offset(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return Some(0);
    }
    let (negative, rest) = match raw.as_bytes().first()? {
        b'+' => (false, &raw[1..]),
        b'-' => (true, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    let seconds = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    if negative {
        seconds.checked_neg()
    } else {
        Some(seconds)
    }
}

/// How the host's zone is discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ZoneProbe {
    /// Ask the operating system.
    #[default]
    System,
    /// Fixed answers, for tests and containers without zone data.
    Fixed {
        /// IANA name the OS would report.
        zone: Option<String>,
        /// Current local offset in seconds east of UTC.
        offset_seconds: Option<i32>,
    },
}

impl ZoneProbe {
    /// IANA zone name reported by the host.
    pub fn system_zone(&self) -> Option<String> {
        match self {
            Self::System => iana_time_zone::get_timezone().ok(),
            Self::Fixed { zone, .. } => zone.clone(),
        }
    }

    /// Current local UTC offset in seconds.
    pub fn local_offset_seconds(&self) -> Option<i32> {
        match self {
            Self::System => Some(chrono::Local::now().offset().local_minus_utc()),
            Self::Fixed { offset_seconds, .. } => *offset_seconds,
        }
    }
}

/// Everything the cascade looks at.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneSources<'a> {
    /// Caller or config profile zone.
    pub profile: Option<&'a str>,
    /// Host probe.
    pub probe: &'a ZoneProbe,
    /// Offset key → IANA name.
    pub offsets: &'a BTreeMap<String, String>,
}

fn parse_zone(name: &str, step: &'static str) -> Option<Tz> {
    match name.trim().parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::debug!(zone = name, step, "unrecognised zone name, falling through");
            None
        }
    }
}

fn zone_for_offset(offsets: &BTreeMap<String, String>, seconds: i32) -> Option<Tz> {
    offsets.iter().find_map(|(key, name)| match parse_utc_offset(key) {
        Some(off) if off == seconds => parse_zone(name, "offset_table"),
        Some(_) => None,
        None => {
            tracing::warn!(key = %key, "skipping invalid timezone offset key");
            None
        }
    })
}

/// Resolve the zone for a turn. Total: falls back to UTC.
pub fn resolve_timezone(sources: &TimezoneSources<'_>) -> Tz {
    let resolved = sources
        .profile
        .and_then(|name| parse_zone(name, "profile"))
        .or_else(|| {
            sources
                .probe
                .system_zone()
                .and_then(|name| parse_zone(&name, "system"))
        })
        .or_else(|| {
            sources
                .probe
                .local_offset_seconds()
                .and_then(|secs| zone_for_offset(sources.offsets, secs))
        })
        .unwrap_or(Tz::UTC);
    tracing::debug!(zone = %resolved.name(), "resolved timezone");
    resolved
}
