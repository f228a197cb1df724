//! Tests for calendar listing parsing and rendering.

use rituo::format::calendar::{format_events, parse_events};

const LISTING: &str = "Successfully retrieved 2 events from calendar 'primary' for me@example.com:\n\
- \"Standup\" (Starts: 2024-01-02T09:00:00+00:00, Ends: 2024-01-02T09:15:00+00:00) ID: e1 | Link: https://www.google.com/calendar/event?eid=E1\n\
- \"Offsite\" (Starts: 2024-01-05, Ends: 2024-01-06) ID: e2";

#[test]
fn parses_each_event_line() {
    let events = parse_events(LISTING);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Standup");
    assert_eq!(events[0].start, "2024-01-02T09:00:00+00:00");
    assert_eq!(
        events[0].link.as_deref(),
        Some("https://www.google.com/calendar/event?eid=E1")
    );
    assert_eq!(events[1].end, "2024-01-06");
    assert!(events[1].link.is_none());
}

#[test]
fn renders_numbered_blocks() {
    let text = format_events(LISTING).expect("events parse");
    assert!(text.starts_with("Upcoming events (2):"));
    assert!(text.contains("1. Standup\n   When: Tue 02 Jan 2024, 09:00 to Tue 02 Jan 2024, 09:15"));
    assert!(text.contains("   Link: https://www.google.com/calendar/event?eid=E1"));
    assert!(text.contains("2. Offsite\n   When: Fri 05 Jan 2024 (all day) to Sat 06 Jan 2024 (all day)"));
}

#[test]
fn unrecognised_listing_is_not_reformatted() {
    assert!(format_events("No events found for the next 7 days.").is_none());
}

#[test]
fn mixed_listing_keeps_unparsed_lines() {
    let raw = "Events for me@example.com:\n\
- \"Standup\" (Starts: 2024-01-02T09:00:00+00:00, Ends: 2024-01-02T09:15:00+00:00) ID: e1\n\
- Lunch with Kim (Starts: 2024-01-02T12:00:00+00:00)\n\
\n\
(2 more events not shown)";
    let text = format_events(raw).expect("one event parses");

    assert!(text.starts_with("Upcoming events (1):\n\nEvents for me@example.com:"));
    assert!(text.contains("1. Standup\n   When: "));
    assert!(text.contains("- Lunch with Kim (Starts: 2024-01-02T12:00:00+00:00)"));
    assert!(text.ends_with("(2 more events not shown)"));
}
