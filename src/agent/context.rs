//! System prompt assembly and bounded conversation history.
//!
//! The model sees the system prompt, at most `limit` prior user/assistant
//! messages (oldest first), then the current utterance.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::providers::{Message, Role};

// ---------------------------------------------------------------------------
// System prompt assembly
// ---------------------------------------------------------------------------

/// Facts about the caller that go into the system prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptFacts<'a> {
    /// Assistant display name.
    pub assistant_name: &'a str,
    /// Caller display name, if known.
    pub user_name: Option<&'a str>,
    /// Caller account.
    pub user_identity: &'a str,
    /// The turn's "now" in the caller's zone.
    pub now: DateTime<Tz>,
}

/// Build the system prompt.
///
/// Sections:
/// 1. Identity of the assistant and the user
/// 2. Capabilities (calendar, mail, tasks)
/// 3. Current date/time and zone
pub fn assemble_system_prompt(facts: &PromptFacts<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    let user = facts.user_name.unwrap_or(facts.user_identity);
    sections.push(format!(
        "You are {}, a concise assistant helping {user} ({}) manage their Google Workspace.",
        facts.assistant_name, facts.user_identity
    ));

    sections.push(
        "## Capabilities\n\
         - Google Calendar: create events, list upcoming events\n\
         - Gmail: send messages, search the inbox\n\
         - Google Tasks: create tasks, list open tasks\n\
         Actions run when the user confirms or gives a direct instruction. \
         Do not claim an action was performed unless you were told it was."
            .to_owned(),
    );

    sections.push(format!(
        "## Current Context\nDate/Time: {}\nTimezone: {}",
        facts.now.format("%A %Y-%m-%d %H:%M"),
        facts.now.timezone().name()
    ));

    sections.join("\n\n")
}

// ---------------------------------------------------------------------------
// History bounding
// ---------------------------------------------------------------------------

/// The most recent `limit` user/assistant messages, oldest first.
///
/// System messages in stored history are dropped; the prompt is rebuilt
/// every turn.
pub fn bounded_history(history: &[Message], limit: usize) -> Vec<Message> {
    let conversational: Vec<&Message> = history
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .collect();
    let skip = conversational.len().saturating_sub(limit);
    conversational.into_iter().skip(skip).cloned().collect()
}

/// Full message list for one completion.
pub fn build_messages(
    system_prompt: String,
    history: &[Message],
    utterance: &str,
    limit: usize,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(limit.saturating_add(2));
    messages.push(Message::new(Role::System, system_prompt));
    messages.extend(bounded_history(history, limit));
    messages.push(Message::new(Role::User, utterance));
    messages
}
