//! Tests for system prompt assembly and history bounding.

use chrono::TimeZone;
use chrono_tz::Tz;

use rituo::agent::context::{assemble_system_prompt, bounded_history, build_messages, PromptFacts};
use rituo::providers::{Message, Role};

fn history(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            Message::new(role, format!("message {i}"))
        })
        .collect()
}

#[test]
fn history_keeps_most_recent_in_order() {
    let kept = bounded_history(&history(25), 10);
    assert_eq!(kept.len(), 10);
    assert_eq!(kept[0].content, "message 15");
    assert_eq!(kept[9].content, "message 24");
}

#[test]
fn short_history_is_kept_whole() {
    let kept = bounded_history(&history(3), 10);
    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0].content, "message 0");
}

#[test]
fn stored_system_messages_are_dropped() {
    let mut stored = vec![Message::new(Role::System, "stale prompt")];
    stored.extend(history(2));
    let kept = bounded_history(&stored, 10);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|m| m.role != Role::System));
}

#[test]
fn messages_wrap_history_with_prompt_and_utterance() {
    let messages = build_messages("prompt".to_owned(), &history(30), "what now?", 10);
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "message 20");
    assert_eq!(messages[11].role, Role::User);
    assert_eq!(messages[11].content, "what now?");
}

#[test]
fn zero_limit_sends_no_history() {
    let messages = build_messages("prompt".to_owned(), &history(4), "hi", 0);
    assert_eq!(messages.len(), 2);
}

#[test]
fn prompt_carries_identity_and_local_time() {
    let now = Tz::Asia__Kolkata
        .with_ymd_and_hms(2024, 1, 1, 14, 30, 0)
        .single()
        .expect("fixed instant");
    let prompt = assemble_system_prompt(&PromptFacts {
        assistant_name: "Rituo",
        user_name: Some("Priya"),
        user_identity: "priya@example.com",
        now,
    });

    assert!(prompt.starts_with("You are Rituo"));
    assert!(prompt.contains("Priya (priya@example.com)"));
    assert!(prompt.contains("## Capabilities"));
    assert!(prompt.contains("Date/Time: Monday 2024-01-01 14:30"));
    assert!(prompt.contains("Timezone: Asia/Kolkata"));
}

#[test]
fn prompt_falls_back_to_identity_without_name() {
    let now = Tz::UTC
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("fixed instant");
    let prompt = assemble_system_prompt(&PromptFacts {
        assistant_name: "Rituo",
        user_name: None,
        user_identity: "me@example.com",
        now,
    });
    assert!(prompt.contains("helping me@example.com (me@example.com)"));
}
