//! Calendar listing reformatting.
//!
//! Parses event lines of the form
//! `- "Title" (Starts: <start>, Ends: <end>) ID: <id> | Link: <url>`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

static EVENT_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"^\s*-\s*"(?P<title>[^"]*)"\s*\(Starts:\s*(?P<start>[^,]+),\s*Ends:\s*(?P<end>[^)]+)\)(?P<rest>.*)$"#)
        .ok()
});
static LINK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Link:\s*(\S+)").ok());
static EVENT_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"https?://\S*calendar\S*").ok());

/// One parsed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    /// Event summary.
    pub title: String,
    /// Raw start value.
    pub start: String,
    /// Raw end value.
    pub end: String,
    /// HTML link, when listed.
    pub link: Option<String>,
}

fn parse_event_line(line: &str) -> Option<EventEntry> {
    let caps = EVENT_LINE.as_ref()?.captures(line)?;
    let link = caps
        .name("rest")
        .and_then(|rest| LINK.as_ref()?.captures(rest.as_str()))
        .map(|c| c[1].trim_end_matches(['.', ',']).to_owned());
    Some(EventEntry {
        title: caps["title"].trim().to_owned(),
        start: caps["start"].trim().to_owned(),
        end: caps["end"].trim().to_owned(),
        link,
    })
}

/// Parse every event line in `raw`. Non-matching lines are skipped.
pub fn parse_events(raw: &str) -> Vec<EventEntry> {
    raw.lines().filter_map(parse_event_line).collect()
}

/// Human rendering of an RFC 3339 instant, a local wall time or an all-day
/// date. Anything else is returned as is.
pub fn humanize_time(raw: &str) -> String {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.format("%a %d %b %Y, %H:%M").to_string();
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return at.format("%a %d %b %Y, %H:%M").to_string();
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.format("%a %d %b %Y (all day)").to_string();
    }
    raw.to_owned()
}

fn render_event(n: usize, event: &EventEntry) -> String {
    let title = if event.title.is_empty() {
        "(no title)"
    } else {
        event.title.as_str()
    };
    let mut out = format!(
        "{n}. {title}\n   When: {} to {}",
        humanize_time(&event.start),
        humanize_time(&event.end)
    );
    if let Some(link) = &event.link {
        out.push_str(&format!("\n   Link: {link}"));
    }
    out
}

/// Reformat a listing into numbered blocks; `None` if no event line parses.
///
/// Lines that are not events (headers, unquoted entries) stay in place,
/// verbatim.
pub fn format_events(raw: &str) -> Option<String> {
    let mut count = 0_usize;
    let mut blocks = Vec::new();
    for line in raw.lines() {
        match parse_event_line(line) {
            Some(event) => {
                count = count.saturating_add(1);
                blocks.push(render_event(count, &event));
            }
            None if !line.trim().is_empty() => blocks.push(line.trim().to_owned()),
            None => {}
        }
    }
    (count > 0).then(|| format!("Upcoming events ({count}):\n\n{}", blocks.join("\n\n")))
}

/// Event link in a creation result.
pub fn creation_link(raw: &str) -> Option<String> {
    if let Some(caps) = LINK.as_ref().and_then(|re| re.captures(raw)) {
        return Some(caps[1].trim_end_matches(['.', ',']).to_owned());
    }
    EVENT_LINK
        .as_ref()?
        .find(raw)
        .map(|m| m.as_str().trim_end_matches(['.', ',']).to_owned())
}
