//! Task listing reformatting.
//!
//! A listing is a sequence of `- Title (ID: <id>)` lines, each followed by
//! optional indented `Status:`, `Due:` and `Notes:` lines.

use std::sync::LazyLock;

use regex::Regex;

static TASK_HEAD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*(?P<title>.+?)\s*\(ID:\s*(?P<id>[^)]+)\)\s*$").ok());
static TASK_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bID:\s*([^)\s,]+)").ok());

/// One parsed task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEntry {
    /// Task title.
    pub title: String,
    /// Task id.
    pub id: String,
    /// `needsAction` or `completed`.
    pub status: Option<String>,
    /// Due value as listed.
    pub due: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Detail lines with no known label, verbatim.
    pub extra: Vec<String>,
}

impl TaskEntry {
    fn is_done(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("completed"))
    }
}

fn field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let value = line.trim().strip_prefix(label)?.trim();
    (!value.is_empty()).then_some(value)
}

/// Lines before the first task, plus the tasks.
fn parse_listing(raw: &str) -> (Vec<String>, Vec<TaskEntry>) {
    let mut preamble = Vec::new();
    let mut tasks: Vec<TaskEntry> = Vec::new();
    let Some(head) = TASK_HEAD.as_ref() else {
        return (preamble, tasks);
    };
    for line in raw.lines() {
        if let Some(caps) = head.captures(line) {
            tasks.push(TaskEntry {
                title: caps["title"].trim().to_owned(),
                id: caps["id"].trim().to_owned(),
                ..TaskEntry::default()
            });
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(current) = tasks.last_mut() else {
            preamble.push(trimmed.to_owned());
            continue;
        };
        if let Some(v) = field(line, "Status:") {
            current.status = Some(v.to_owned());
        } else if let Some(v) = field(line, "Due:") {
            current.due = Some(v.to_owned());
        } else if let Some(v) = field(line, "Notes:") {
            current.notes = Some(v.to_owned());
        } else {
            current.extra.push(trimmed.to_owned());
        }
    }
    (preamble, tasks)
}

/// Parse task blocks. Lines before the first head are not part of any task.
pub fn parse_tasks(raw: &str) -> Vec<TaskEntry> {
    parse_listing(raw).1
}

/// Reformat a listing into per-task blocks; `None` if no head line parses.
///
/// Header lines and unlabelled detail lines are carried over verbatim.
pub fn format_tasks(raw: &str) -> Option<String> {
    let (preamble, tasks) = parse_listing(raw);
    if tasks.is_empty() {
        return None;
    }
    let open = tasks.iter().filter(|t| !t.is_done()).count();
    let mut out = format!("Your tasks ({} total, {open} open):", tasks.len());
    if !preamble.is_empty() {
        out.push_str(&format!("\n\n{}", preamble.join("\n")));
    }
    for (n, task) in (1_usize..).zip(&tasks) {
        let mark = if task.is_done() { "[x]" } else { "[ ]" };
        out.push_str(&format!("\n\n{n}. {mark} {}", task.title));
        if let Some(due) = &task.due {
            out.push_str(&format!("\n   Due: {due}"));
        }
        if let Some(notes) = &task.notes {
            out.push_str(&format!("\n   Notes: {notes}"));
        }
        out.push_str(&format!("\n   ID: {}", task.id));
        for line in &task.extra {
            out.push_str(&format!("\n   {line}"));
        }
    }
    Some(out)
}

/// Task id in a creation result, from `ID: <id>` or `(ID: <id>)`.
pub fn created_task_id(raw: &str) -> Option<String> {
    let caps = TASK_ID.as_ref()?.captures(raw)?;
    Some(caps[1].trim_end_matches('.').to_owned())
}
