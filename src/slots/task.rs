//! Task title extraction and listing detection.

use std::sync::LazyLock;

use regex::Regex;

use super::title::capitalize_first;
use super::{first_match, Rule};
use crate::intent::contains_bounded;

/// Title used when nothing usable is found.
pub const DEFAULT_TASK_TITLE: &str = "New task";

static VERB_TASK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:add|create|make|new|set)\s+(?:(?:a|an|new|me\s+a)\s+)*(?:task|todo|to-do|reminder)\s*(?::|-|\bto\b|\bfor\b|\bcalled\b|\bnamed\b)\s*(.+)",
    )
    .ok()
});
static BARE_TASK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:task|todo|to-do|reminder)\s*(?::|-|\bto\b|\bfor\b|\bcalled\b|\bnamed\b)\s*(.+)")
        .ok()
});
static REMIND_ME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bremind me to\s+(.+)").ok());
static ADD_TO_LIST: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\badd\s+(.+?)\s+to\s+my\s+(?:task|todo|to-do)s?(?:\s+list)?\b").ok()
});
static TRAILING_WHEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+(?:(?:by|on|before|due|until|for)\s+)?(?:tomorrow|today|tonight|day after tomorrow|(?:next|this)\s+(?:week|weekend|month|morning|afternoon|evening|(?:mon|tues|wednes|thurs|fri|satur|sun)day)|(?:mon|tues|wednes|thurs|fri|satur|sun)day|\d{4}-\d{2}-\d{2}|at\s+\d{1,2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?)\b.*$",
    )
    .ok()
});

/// Matches that are just the category word.
const TOO_GENERIC: [&str; 8] = [
    "task", "tasks", "todo", "to-do", "reminder", "a task", "new task", "it",
];

fn clean(raw: &str) -> Option<String> {
    let mut title = raw.trim().to_owned();
    if let Some(re) = TRAILING_WHEN.as_ref() {
        title = re.replace(&title, "").into_owned();
    }
    let title = title
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != ')')
        .trim_matches(|c: char| c == '"' || c == '“' || c == '”')
        .trim();
    if title.is_empty() || TOO_GENERIC.contains(&title.to_lowercase().as_str()) {
        return None;
    }
    Some(capitalize_first(title))
}

fn capture_clean(regex: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
    let caps = regex.as_ref()?.captures(text)?;
    clean(&caps[1])
}

fn verb_task(text: &str) -> Option<String> {
    capture_clean(&VERB_TASK, text)
}

fn bare_task(text: &str) -> Option<String> {
    capture_clean(&BARE_TASK, text)
}

fn remind_me(text: &str) -> Option<String> {
    capture_clean(&REMIND_ME, text)
}

fn add_to_list(text: &str) -> Option<String> {
    capture_clean(&ADD_TO_LIST, text)
}

const TITLE_RULES: [Rule<String>; 4] = [verb_task, add_to_list, remind_me, bare_task];

/// Task title if a phrase pattern yields a non-generic value.
pub fn find_title(text: &str) -> Option<String> {
    first_match(text, &TITLE_RULES)
}

/// Task title, falling back to [`DEFAULT_TASK_TITLE`].
pub fn title(text: &str) -> String {
    find_title(text).unwrap_or_else(|| DEFAULT_TASK_TITLE.to_owned())
}

const CREATE_WORDS: [&str; 5] = ["add", "create", "make", "new", "remind me"];

/// Whether the user asked to see tasks rather than add one.
///
/// A configured cue decides outright; a bare "my tasks" counts only when no
/// creation verb is present ("add milk to my tasks" is a creation).
pub fn wants_listing(text: &str, cues: &[String]) -> bool {
    let lowered = text.to_lowercase();
    if cues
        .iter()
        .map(|c| c.trim().to_lowercase())
        .any(|cue| contains_bounded(&lowered, &cue, false))
    {
        return true;
    }
    let mentions_own = ["my tasks", "my todos", "my to-dos"]
        .iter()
        .any(|p| contains_bounded(&lowered, p, true));
    mentions_own && !CREATE_WORDS.iter().any(|w| contains_bounded(&lowered, w, true))
}
