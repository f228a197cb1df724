//! Mail search query extraction.
//!
//! Phrase cues become Gmail query operators. Cues combine; with none the
//! query is the whole inbox.

use std::sync::LazyLock;

use regex::Regex;

use crate::intent::contains_bounded;

/// Query used when no cue matches.
pub const DEFAULT_QUERY: &str = "in:inbox";

static FROM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+([A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}|[A-Za-z][\w.\-]*)")
        .ok()
});
static SUBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsubject\b\s*:?\s*["“]?([^"”]+?)["”]?(?:\s+(?:from|that|which|sent)\b|[.?!]|$)"#)
        .ok()
});

/// Words after "from" that are not senders.
const NOT_SENDERS: [&str; 9] = [
    "my", "the", "today", "yesterday", "last", "this", "me", "work", "inbox",
];

/// Flag cues: (phrase, operator).
const FLAG_CUES: [(&str, &str); 5] = [
    ("unread", "is:unread"),
    ("starred", "is:starred"),
    ("important", "is:important"),
    ("attachment", "has:attachment"),
    ("today", "newer_than:1d"),
];

fn sender(text: &str) -> Option<String> {
    let caps = FROM.as_ref()?.captures(text)?;
    let who = caps[1].trim_end_matches('.');
    if NOT_SENDERS.contains(&who.to_lowercase().as_str()) {
        return None;
    }
    Some(format!("from:{who}"))
}

fn subject(text: &str) -> Option<String> {
    let caps = SUBJECT.as_ref()?.captures(text)?;
    let value = caps[1].trim();
    if value.is_empty() {
        return None;
    }
    if value.contains(char::is_whitespace) {
        Some(format!("subject:\"{value}\""))
    } else {
        Some(format!("subject:{value}"))
    }
}

/// Build a Gmail search query from the utterance.
pub fn search_query(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut fragments: Vec<String> = FLAG_CUES
        .iter()
        .filter(|(cue, _)| contains_bounded(&lowered, cue, false))
        .map(|(_, op)| (*op).to_owned())
        .collect();
    fragments.extend(sender(text));
    fragments.extend(subject(text));

    if fragments.is_empty() {
        DEFAULT_QUERY.to_owned()
    } else {
        fragments.join(" ")
    }
}
