//! Mail field extraction: recipient, subject, body.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{first_match, Rule};

/// Subject used when a body was found but no subject.
pub const DEFAULT_SUBJECT: &str = "Quick note";

/// Extracted mail fields. Each is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailFields {
    /// Recipient address.
    pub to: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Message body.
    pub body: Option<String>,
}

static ADDRESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").ok());

// Subject and body markers stop at the other field's marker.
static SUBJECT_QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:subject|about)\b[:\s]*["“]([^"”]+)["”]"#).ok());
static SUBJECT_PLAIN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:subject(?:\s+line)?|about)\b[:\s]+(.+?)(?:\s*,?\s+(?:saying|message is|body|and say|that says|telling)\b|$)",
    )
    .ok()
});
static BODY_QUOTED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:saying|message is|body|and say|that says|telling (?:him|her|them))\b[:\s]*["“]([^"”]+)["”]"#)
        .ok()
});
static BODY_PLAIN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:saying|message is|body|and say|that says|telling (?:him|her|them))\b[:\s]+(.+?)(?:\s*,?\s+(?:subject|about)\b|$)",
    )
    .ok()
});
static ANY_QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"["“]([^"”]+)["”]"#).ok());

fn capture_trimmed(regex: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
    let caps = regex.as_ref()?.captures(text)?;
    let value = caps[1]
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';'))
        .trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// First address-looking token.
pub fn recipient(text: &str) -> Option<String> {
    let found = ADDRESS.as_ref()?.find(text)?;
    Some(found.as_str().trim_end_matches('.').to_owned())
}

fn subject_quoted(text: &str) -> Option<String> {
    capture_trimmed(&SUBJECT_QUOTED, text)
}

fn subject_plain(text: &str) -> Option<String> {
    capture_trimmed(&SUBJECT_PLAIN, text)
}

fn body_quoted(text: &str) -> Option<String> {
    capture_trimmed(&BODY_QUOTED, text)
}

fn body_plain(text: &str) -> Option<String> {
    capture_trimmed(&BODY_PLAIN, text)
}

fn any_quoted(text: &str) -> Option<String> {
    capture_trimmed(&ANY_QUOTED, text)
}

const SUBJECT_RULES: [Rule<String>; 2] = [subject_quoted, subject_plain];
const BODY_RULES: [Rule<String>; 3] = [body_quoted, body_plain, any_quoted];

/// Subject from "subject ..." / "about ..." markers.
pub fn subject(text: &str) -> Option<String> {
    first_match(text, &SUBJECT_RULES)
}

/// Body from "saying ..." / "message is ..." markers, else any quoted text.
pub fn body(text: &str) -> Option<String> {
    first_match(text, &BODY_RULES)
}

/// Extract all mail fields; a body without a subject gets [`DEFAULT_SUBJECT`].
pub fn extract_fields(text: &str) -> EmailFields {
    let to = recipient(text);
    let subject = subject(text);
    // A lone quoted subject must not double as the body.
    let body = body(text).filter(|b| subject.as_deref() != Some(b.as_str()));
    let subject = subject.or_else(|| body.as_ref().map(|_| DEFAULT_SUBJECT.to_owned()));
    EmailFields { to, subject, body }
}
