//! Non-binding action suggestions appended to conversational replies.
//!
//! Turns carry no pending action, so every suggested phrasing is a complete
//! request that triggers on its own.

use crate::intent::{contains_bounded, ActionCategory};

/// Heading the suggestions are listed under.
pub const SUGGESTIONS_HEADING: &str = "Available actions:";

fn mentions(lowered: &str, words: &[&str]) -> bool {
    words.iter().any(|w| contains_bounded(lowered, w, true))
}

/// Suggestion for a category that matched but did not execute.
pub fn suggestion(category: ActionCategory, utterance: &str) -> Option<&'static str> {
    let lowered = utterance.to_lowercase();
    let text = match category {
        ActionCategory::Calendar => {
            "I can create this calendar event. Ask again in one message with \"go ahead\", like \"go ahead and schedule a meeting with Sam tomorrow at 2pm\"."
        }
        ActionCategory::CalendarSearch => {
            "I can check your calendar. Ask \"what's on my calendar\" to see upcoming events."
        }
        ActionCategory::Email if mentions(&lowered, &["send", "write", "compose"]) => {
            "I can send that email. Start one message with \"send\" and include the address and what to say, like \"send an email to sam@example.com saying see you at 3\"."
        }
        ActionCategory::Email => "I can search your inbox. Try \"check my unread emails\".",
        ActionCategory::Task if mentions(&lowered, &["list", "show"]) => {
            "I can show your current tasks. Ask \"show my tasks\"."
        }
        ActionCategory::Task => {
            "I can add that to Google Tasks. Start one message with \"add\", like \"add a task to buy milk\"."
        }
        ActionCategory::None => return None,
    };
    Some(text)
}

/// `reply` followed by the suggestion block, or `reply` unchanged.
pub fn append_suggestions(reply: &str, category: ActionCategory, utterance: &str) -> String {
    match suggestion(category, utterance) {
        Some(text) => format!("{}\n\n{SUGGESTIONS_HEADING}\n- {text}", reply.trim_end()),
        None => reply.to_owned(),
    }
}
