//! Dispatch outcome → user-facing text.
//!
//! Structured reformatting is attempted per tool. When a result does not
//! have the expected shape the raw text is returned verbatim and the miss is
//! logged at `debug`; nothing is dropped and nothing panics. Output is a pure
//! function of the [`Dispatch`], so formatting the same outcome twice yields
//! identical text.

pub mod calendar;
pub mod tasks;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dispatch::{Dispatch, ErrorKind, Tool, ToolCall, ToolOutcome};
use crate::mcp::ToolResult;

static MESSAGE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:-\s*)?Message ID:").ok());

/// OAuth scope a tool needs.
pub fn required_scope(tool: Tool) -> &'static str {
    match tool {
        Tool::CreateEvent | Tool::GetEvents => "https://www.googleapis.com/auth/calendar",
        Tool::SendGmailMessage => "https://www.googleapis.com/auth/gmail.send",
        Tool::SearchGmailMessages => "https://www.googleapis.com/auth/gmail.readonly",
        Tool::ListTaskLists | Tool::ListTasks | Tool::CreateTask => {
            "https://www.googleapis.com/auth/tasks"
        }
    }
}

fn action_phrase(tool: Tool) -> &'static str {
    match tool {
        Tool::CreateEvent => "create the calendar event",
        Tool::GetEvents => "check your calendar",
        Tool::SendGmailMessage => "send the email",
        Tool::SearchGmailMessages => "search your mail",
        Tool::ListTaskLists => "read your task lists",
        Tool::ListTasks => "list your tasks",
        Tool::CreateTask => "create the task",
    }
}

/// Text for a failed call, keyed on the fault class.
pub fn format_failure(tool: Tool, kind: ErrorKind, message: &str) -> String {
    let action = action_phrase(tool);
    match kind {
        ErrorKind::AuthRequired => format!(
            "I couldn't {action} because your Google account hasn't granted the required \
             permission. Please reconnect your Google account and allow access to {}.",
            required_scope(tool)
        ),
        ErrorKind::NotFound => format!("I couldn't {action}: {message}"),
        ErrorKind::Generic => format!("Sorry, something went wrong trying to {action}: {message}"),
    }
}

fn raw_or_done(raw: &str, done: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        done.to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn format_created_event(call: &ToolCall, raw: &str) -> String {
    let title = call.str_argument("summary").unwrap_or("Your event");
    let mut out = format!("Event created: {title}");
    if let (Some(start), Some(end)) = (call.str_argument("start_time"), call.str_argument("end_time")) {
        out.push_str(&format!(
            "\nWhen: {} to {}",
            calendar::humanize_time(start),
            calendar::humanize_time(end)
        ));
        if let Some(zone) = call.str_argument("timezone") {
            out.push_str(&format!(" ({zone})"));
        }
    }
    match calendar::creation_link(raw) {
        Some(link) => out.push_str(&format!("\nLink: {link}")),
        None => debug!("no event link in creation result"),
    }
    out
}

fn format_sent(call: &ToolCall, raw: &str) -> String {
    let to = call.str_argument("to").unwrap_or("the recipient");
    let mut out = format!("Email sent to {to}.");
    if let Some(subject) = call.str_argument("subject") {
        out.push_str(&format!("\nSubject: {subject}"));
    }
    if let Some(id) = raw
        .lines()
        .find_map(|l| l.split_once("Message ID:").map(|(_, id)| id.trim()))
        .filter(|id| !id.is_empty())
    {
        out.push_str(&format!("\nMessage ID: {id}"));
    }
    out
}

fn format_search(call: &ToolCall, raw: &str) -> String {
    let query = call.str_argument("query").unwrap_or("your inbox");
    let count = MESSAGE_ID
        .as_ref()
        .map_or(0, |re| re.find_iter(raw).count());
    if count == 0 {
        debug!("no message ids in search result, returning raw text");
        return raw_or_done(raw, &format!("No messages matched {query}."));
    }
    format!("Found {count} message(s) for `{query}`:\n\n{}", raw.trim())
}

/// Title and due from the call; the server's id, or its whole message when
/// it names no id.
fn format_created_task(call: &ToolCall, raw: &str) -> String {
    let title = call.str_argument("title").unwrap_or("Your task");
    let mut out = format!("Task created: {title}");
    if let Some(due) = call.str_argument("due") {
        out.push_str(&format!("\nDue: {}", due.get(..10).unwrap_or(due)));
    }
    match tasks::created_task_id(raw) {
        Some(id) => out.push_str(&format!("\nID: {id}")),
        None if !raw.trim().is_empty() => out.push_str(&format!("\n\n{}", raw.trim())),
        None => debug!("empty task creation result"),
    }
    out
}

fn with_fallback(parsed: Option<String>, raw: &str, what: &str) -> String {
    match parsed {
        Some(text) => text,
        None => {
            debug!(shape = what, "result did not match expected shape, returning raw text");
            raw_or_done(raw, "Nothing to show.")
        }
    }
}

/// Text for a successful call.
pub fn format_success(call: &ToolCall, result: &ToolResult) -> String {
    let raw = result.as_text();
    match call.tool() {
        Tool::CreateEvent => format_created_event(call, &raw),
        Tool::GetEvents => with_fallback(calendar::format_events(&raw), &raw, "events"),
        Tool::SendGmailMessage => format_sent(call, &raw),
        Tool::SearchGmailMessages => format_search(call, &raw),
        Tool::ListTasks => with_fallback(tasks::format_tasks(&raw), &raw, "tasks"),
        Tool::CreateTask => format_created_task(call, &raw),
        Tool::ListTaskLists => raw_or_done(&raw, "No task lists found."),
    }
}

/// Reply fragment for one dispatch. Never empty.
pub fn format(dispatch: &Dispatch) -> String {
    match &dispatch.outcome {
        ToolOutcome::Success(result) => format_success(&dispatch.call, result),
        ToolOutcome::Failure { kind, message } => {
            format_failure(dispatch.call.tool(), *kind, message)
        }
    }
}
