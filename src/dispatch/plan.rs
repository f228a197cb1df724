//! Category + slots → tool call. Pure: no I/O, no clock reads.

use chrono::{DateTime, Days, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::{json, Value};

use super::catalog::{Tool, ToolCall};
use crate::config::SchedulingConfig;
use crate::intent::ActionCategory;
use crate::slots::datetime::{default_end, fallback_start, format_local};
use crate::slots::email::DEFAULT_SUBJECT;
use crate::slots::query::DEFAULT_QUERY;
use crate::slots::task::DEFAULT_TASK_TITLE;
use crate::slots::title::DEFAULT_EVENT_TITLE;
use crate::slots::SlotSet;

/// Well-known id used when the default task list cannot be resolved.
pub const DEFAULT_TASK_LIST: &str = "@default";

/// Calendar all reads and writes go to.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Per-turn inputs to planning.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    /// The turn's "now" in `zone`.
    pub now: DateTime<Tz>,
    /// Resolved caller zone.
    pub zone: Tz,
    /// Event defaults and search window.
    pub scheduling: &'a SchedulingConfig,
    /// Acting account.
    pub caller_identity: &'a str,
}

fn text(value: impl Into<String>) -> Option<Value> {
    Some(Value::String(value.into()))
}

fn rfc3339_in(zone: Tz, local: NaiveDateTime) -> Option<String> {
    zone.from_local_datetime(&local)
        .earliest()
        .map(|at| at.to_rfc3339())
}

fn plan_calendar(slots: &SlotSet, ctx: &PlanContext<'_>) -> Option<ToolCall> {
    let start = match slots.start_time {
        Some(start) => start,
        None => fallback_start(ctx.now, ctx.scheduling)?,
    };
    let end = match slots.end_time.filter(|end| *end > start) {
        Some(end) => end,
        None => default_end(start, ctx.scheduling)?,
    };
    let summary = slots
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_owned());

    Some(ToolCall::new(
        Tool::CreateEvent,
        ctx.caller_identity,
        [
            ("calendar_id", text(PRIMARY_CALENDAR)),
            ("summary", text(summary)),
            ("start_time", text(format_local(start))),
            ("end_time", text(format_local(end))),
            ("timezone", text(ctx.zone.name())),
        ],
    ))
}

fn plan_calendar_search(slots: &SlotSet, ctx: &PlanContext<'_>) -> Option<ToolCall> {
    let from = slots
        .start_time
        .unwrap_or_else(|| ctx.now.naive_local());
    let until = from.checked_add_days(Days::new(u64::from(ctx.scheduling.search_days.max(1))))?;

    Some(ToolCall::new(
        Tool::GetEvents,
        ctx.caller_identity,
        [
            ("calendar_id", text(PRIMARY_CALENDAR)),
            ("time_min", rfc3339_in(ctx.zone, from).map(Value::String)),
            ("time_max", rfc3339_in(ctx.zone, until).map(Value::String)),
            ("max_results", Some(json!(ctx.scheduling.max_results))),
        ],
    ))
}

fn plan_email(slots: &SlotSet, ctx: &PlanContext<'_>) -> ToolCall {
    match (&slots.to, &slots.body) {
        (Some(to), Some(body)) => ToolCall::new(
            Tool::SendGmailMessage,
            ctx.caller_identity,
            [
                ("to", text(to.as_str())),
                (
                    "subject",
                    text(slots.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)),
                ),
                ("body", text(body.as_str())),
            ],
        ),
        _ => ToolCall::new(
            Tool::SearchGmailMessages,
            ctx.caller_identity,
            [
                (
                    "query",
                    text(slots.query.as_deref().unwrap_or(DEFAULT_QUERY)),
                ),
                ("page_size", Some(json!(ctx.scheduling.mail_page_size))),
            ],
        ),
    }
}

fn plan_task(slots: &SlotSet, ctx: &PlanContext<'_>) -> ToolCall {
    if slots.wants_listing {
        return ToolCall::new(
            Tool::ListTasks,
            ctx.caller_identity,
            [
                ("task_list_id", text(DEFAULT_TASK_LIST)),
                ("max_results", Some(json!(ctx.scheduling.max_results))),
            ],
        );
    }
    // The Tasks API stores dates only; it expects midnight UTC.
    let due = slots
        .due
        .map(|day| format!("{}T00:00:00.000Z", day.format("%Y-%m-%d")));
    ToolCall::new(
        Tool::CreateTask,
        ctx.caller_identity,
        [
            ("task_list_id", text(DEFAULT_TASK_LIST)),
            (
                "title",
                text(slots.title.as_deref().unwrap_or(DEFAULT_TASK_TITLE)),
            ),
            ("due", due.map(Value::String)),
        ],
    )
}

/// Plan the single tool call for a category. `None` for
/// [`ActionCategory::None`].
///
/// Missing slots get their defaults here: tomorrow at the default hour for
/// an event start, the default length for its end, a search instead of a
/// send when recipient or body is missing.
pub fn plan(category: ActionCategory, slots: &SlotSet, ctx: &PlanContext<'_>) -> Option<ToolCall> {
    match category {
        ActionCategory::Calendar => plan_calendar(slots, ctx),
        ActionCategory::CalendarSearch => plan_calendar_search(slots, ctx),
        ActionCategory::Email => Some(plan_email(slots, ctx)),
        ActionCategory::Task => Some(plan_task(slots, ctx)),
        ActionCategory::None => None,
    }
}
