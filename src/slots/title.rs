//! Calendar event title extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::{first_match, Rule};

/// Summary used when no title can be extracted.
pub const DEFAULT_EVENT_TITLE: &str = "New event";

static WITH_PERSON: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(meeting|call|lunch|coffee|sync|catch-?up|dinner|interview)\s+with\s+(?:(the|my|our)\s+)?(.+)",
    )
    .ok()
});
static QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"["“]([^"”]{2,})["”]"#).ok());
static AFTER_VERB: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:schedule|book|create|add|set up|put|plan)\s+(?:(?:a|an|the|my)\s+)?(.+?)(?:\s+(?:for|on|at|from|tomorrow|today|tonight|next|this|in|to my calendar|to calendar)\b|[.!?]|$)",
    )
    .ok()
});

const GENERIC: [&str; 6] = ["event", "calendar event", "new event", "something", "it", "one"];

pub(crate) fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Words that end a name: time words, prepositions, digits.
const NAME_STOPS: [&str; 16] = [
    "tomorrow", "today", "tonight", "at", "on", "next", "this", "for", "from", "in", "to",
    "about", "regarding", "until", "by", "and",
];

/// Leading words of `rest` that form a name. Without a determiner only
/// capitalised words continue the name.
fn name_words(rest: &str, allow_lowercase: bool) -> Option<String> {
    let mut words: Vec<&str> = Vec::new();
    for raw in rest.split_whitespace().take(4) {
        let word = raw.trim_end_matches(|c: char| c.is_ascii_punctuation());
        let lowered = word.to_lowercase();
        if word.is_empty()
            || NAME_STOPS.contains(&lowered.as_str())
            || word.chars().any(|c| c.is_ascii_digit())
            || !word.chars().next().is_some_and(char::is_alphabetic)
        {
            break;
        }
        if !words.is_empty() && !allow_lowercase && !word.chars().next().is_some_and(char::is_uppercase) {
            break;
        }
        words.push(word);
        if word.len() != raw.len() {
            break;
        }
    }
    (!words.is_empty()).then(|| words.join(" "))
}

fn with_person(text: &str) -> Option<String> {
    let caps = WITH_PERSON.as_ref()?.captures(text)?;
    let kind = capitalize_first(&caps[1].to_lowercase());
    let determiner = caps.get(2).map(|m| m.as_str().to_lowercase());
    let name = name_words(&caps[3], determiner.is_some())?;
    match determiner {
        Some(det) => Some(format!("{kind} with {det} {name}")),
        None => Some(format!("{kind} with {}", capitalize_first(&name))),
    }
}

fn quoted(text: &str) -> Option<String> {
    let caps = QUOTED.as_ref()?.captures(text)?;
    let inner = caps[1].trim();
    (!inner.is_empty()).then(|| inner.to_owned())
}

fn after_verb(text: &str) -> Option<String> {
    let caps = AFTER_VERB.as_ref()?.captures(text)?;
    let phrase = caps[1].trim().trim_end_matches(|c: char| c.is_ascii_punctuation());
    if phrase.is_empty() || GENERIC.contains(&phrase.to_lowercase().as_str()) {
        return None;
    }
    Some(capitalize_first(phrase))
}

const TITLE_RULES: [Rule<String>; 3] = [with_person, quoted, after_verb];

/// Event summary from the utterance; `None` means use [`DEFAULT_EVENT_TITLE`].
pub fn event_title(text: &str) -> Option<String> {
    first_match(text, &TITLE_RULES)
}
