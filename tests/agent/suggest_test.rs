//! Tests for suggestion blocks.

use rituo::agent::suggest::{append_suggestions, suggestion, SUGGESTIONS_HEADING};
use rituo::intent::ActionCategory;

#[test]
fn matched_category_appends_block() {
    let reply = append_suggestions("Sure, sounds good.\n", ActionCategory::Calendar, "a meeting maybe");
    assert!(reply.starts_with("Sure, sounds good.\n\nAvailable actions:\n- "));
    assert!(reply.contains("calendar event"));
}

#[test]
fn no_category_leaves_reply_untouched() {
    assert_eq!(append_suggestions("Hello!", ActionCategory::None, "hi"), "Hello!");
    assert!(suggestion(ActionCategory::None, "hi").is_none());
}

#[test]
fn suggestion_follows_wording() {
    let send = suggestion(ActionCategory::Email, "write an email to bob").expect("email suggestion");
    assert!(send.contains("send that email"));
    let search = suggestion(ActionCategory::Email, "anything in gmail?").expect("email suggestion");
    assert!(search.contains("search your inbox"));
}

#[test]
fn heading_is_stable() {
    assert_eq!(SUGGESTIONS_HEADING, "Available actions:");
}
