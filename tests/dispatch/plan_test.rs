//! Tests for planning tool calls from categories and slots.

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde_json::json;

use rituo::config::{IntentConfig, SchedulingConfig};
use rituo::dispatch::{plan, PlanContext, Tool, ToolCall, DEFAULT_TASK_LIST, PRIMARY_CALENDAR};
use rituo::intent::{ActionCategory, IntentClassifier};
use rituo::slots::{extract, ExtractionContext, SlotSet};

const CALLER: &str = "sam.owner@example.com";

fn now_in(zone: Tz) -> DateTime<Tz> {
    zone.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("fixed local instant")
}

fn plan_in(zone: Tz, category: ActionCategory, slots: &SlotSet) -> Option<ToolCall> {
    let scheduling = SchedulingConfig::default();
    plan(
        category,
        slots,
        &PlanContext {
            now: now_in(zone),
            zone,
            scheduling: &scheduling,
            caller_identity: CALLER,
        },
    )
}

/// Classify, extract and plan one utterance at Monday 2024-01-01 09:00.
fn resolve(zone: Tz, utterance: &str) -> Option<ToolCall> {
    let intent = IntentConfig::default();
    let scheduling = SchedulingConfig::default();
    let category = IntentClassifier::from_config(&intent).classify(utterance);
    let slots = extract(
        category,
        utterance,
        &ExtractionContext {
            now: now_in(zone),
            scheduling: &scheduling,
            intent: &intent,
        },
    );
    plan_in(zone, category, &slots)
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[test]
fn meeting_request_plans_create_event() {
    let call = resolve(Tz::UTC, "schedule meeting with Sam tomorrow at 2pm").expect("planned");

    assert_eq!(call.tool(), Tool::CreateEvent);
    assert_eq!(call.caller_identity(), CALLER);
    assert_eq!(call.str_argument("calendar_id"), Some(PRIMARY_CALENDAR));
    assert_eq!(call.str_argument("start_time"), Some("2024-01-02T14:00:00"));
    assert_eq!(call.str_argument("end_time"), Some("2024-01-02T15:00:00"));
    assert!(call
        .str_argument("summary")
        .is_some_and(|summary| summary.contains("Sam")));
}

#[test]
fn event_times_are_local_with_zone_named_separately() {
    let call = resolve(Tz::America__New_York, "schedule meeting with Sam tomorrow at 2pm")
        .expect("planned");
    assert_eq!(call.str_argument("start_time"), Some("2024-01-02T14:00:00"));
    assert_eq!(call.str_argument("timezone"), Some("America/New_York"));
}

#[test]
fn missing_start_defaults_to_tomorrow_afternoon() {
    let slots = SlotSet {
        title: Some("Planning".to_owned()),
        ..SlotSet::default()
    };
    let call = plan_in(Tz::UTC, ActionCategory::Calendar, &slots).expect("planned");
    assert_eq!(call.str_argument("start_time"), Some("2024-01-02T14:00:00"));
    assert_eq!(call.str_argument("end_time"), Some("2024-01-02T15:00:00"));
}

#[test]
fn explicit_end_is_kept() {
    let call = resolve(Tz::UTC, "book a meeting with Ana tomorrow 2pm to 4pm").expect("planned");
    assert_eq!(call.str_argument("end_time"), Some("2024-01-02T16:00:00"));
}

#[test]
fn untitled_event_gets_default_summary() {
    let call = plan_in(Tz::UTC, ActionCategory::Calendar, &SlotSet::default()).expect("planned");
    assert_eq!(call.str_argument("summary"), Some("New event"));
}

// ---------------------------------------------------------------------------
// Calendar search
// ---------------------------------------------------------------------------

#[test]
fn lookup_spans_search_window_from_now() {
    let call =
        plan_in(Tz::UTC, ActionCategory::CalendarSearch, &SlotSet::default()).expect("planned");
    assert_eq!(call.tool(), Tool::GetEvents);
    assert_eq!(call.str_argument("time_min"), Some("2024-01-01T09:00:00+00:00"));
    assert_eq!(call.str_argument("time_max"), Some("2024-01-08T09:00:00+00:00"));
    assert_eq!(call.argument("max_results"), Some(&json!(10)));
    assert!(!call.tool().has_side_effects());
}

#[test]
fn lookup_bounds_carry_zone_offset() {
    let slots = SlotSet {
        start_time: NaiveDate::from_ymd_opt(2024, 1, 5).and_then(|d| d.and_hms_opt(0, 0, 0)),
        ..SlotSet::default()
    };
    let call =
        plan_in(Tz::Asia__Kolkata, ActionCategory::CalendarSearch, &slots).expect("planned");
    assert_eq!(call.str_argument("time_min"), Some("2024-01-05T00:00:00+05:30"));
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

#[test]
fn recipient_and_body_plan_a_send() {
    let call = resolve(Tz::UTC, "send email to a@b.com saying \"hi there\"").expect("planned");
    assert_eq!(call.tool(), Tool::SendGmailMessage);
    assert_eq!(call.str_argument("to"), Some("a@b.com"));
    assert_eq!(call.str_argument("body"), Some("hi there"));
    assert_eq!(call.str_argument("subject"), Some("Quick note"));
}

#[test]
fn missing_body_plans_a_search() {
    let call = resolve(Tz::UTC, "check my inbox for unread mail").expect("planned");
    assert_eq!(call.tool(), Tool::SearchGmailMessages);
    assert_eq!(call.str_argument("query"), Some("is:unread"));
    assert!(call.argument("to").is_none());
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[test]
fn task_creation_formats_due_date() {
    let call = resolve(Tz::UTC, "add a task to call the bank tomorrow").expect("planned");
    assert_eq!(call.tool(), Tool::CreateTask);
    assert_eq!(call.str_argument("title"), Some("Call the bank"));
    assert_eq!(call.str_argument("due"), Some("2024-01-02T00:00:00.000Z"));
    assert_eq!(call.str_argument("task_list_id"), Some(DEFAULT_TASK_LIST));
}

#[test]
fn task_without_date_omits_due() {
    let call = resolve(Tz::UTC, "add a task to buy milk").expect("planned");
    assert_eq!(call.str_argument("title"), Some("Buy milk"));
    assert!(call.argument("due").is_none());
}

#[test]
fn task_listing_plans_list_tasks() {
    let call = resolve(Tz::UTC, "show my tasks").expect("planned");
    assert_eq!(call.tool(), Tool::ListTasks);
}

// ---------------------------------------------------------------------------
// Call records
// ---------------------------------------------------------------------------

#[test]
fn no_category_plans_nothing() {
    assert!(plan_in(Tz::UTC, ActionCategory::None, &SlotSet::default()).is_none());
}

#[test]
fn unaccepted_and_absent_arguments_are_dropped() {
    let call = ToolCall::new(
        Tool::SendGmailMessage,
        CALLER,
        [
            ("to", Some(json!("x@y.z"))),
            ("cc", Some(json!("spy@y.z"))),
            ("body", None),
        ],
    );
    assert_eq!(call.arguments().len(), 1);
    assert_eq!(call.str_argument("to"), Some("x@y.z"));
}

#[test]
fn every_argument_is_accepted_by_its_tool() {
    for utterance in [
        "schedule meeting with Sam tomorrow at 2pm",
        "what's on my calendar",
        "send email to a@b.com saying \"hi\"",
        "check my inbox",
        "add a task to buy milk",
        "show my tasks",
    ] {
        let call = resolve(Tz::UTC, utterance).expect("planned");
        for key in call.arguments().keys() {
            assert!(
                call.tool().accepted_args().contains(&key.as_str()),
                "{key} not accepted by {}",
                call.tool()
            );
        }
    }
}
