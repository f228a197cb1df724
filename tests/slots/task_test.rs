//! Tests for task titles and listing detection.

use rituo::config::IntentConfig;
use rituo::slots::task::{find_title, title, wants_listing, DEFAULT_TASK_TITLE};

#[test]
fn verb_form_title() {
    assert_eq!(title("add a task to buy milk"), "Buy milk");
}

#[test]
fn generic_request_uses_default() {
    assert_eq!(title("create a task"), DEFAULT_TASK_TITLE);
}

#[test]
fn remind_me_drops_due_phrase() {
    assert_eq!(
        find_title("remind me to call mom tomorrow").as_deref(),
        Some("Call mom")
    );
}

#[test]
fn listing_cues_from_config() {
    let cues = IntentConfig::default().task_listing_cues;
    assert!(wants_listing("show my tasks", &cues));
    assert!(wants_listing("what tasks do I have", &cues));
    assert!(!wants_listing("add a task to buy milk", &cues));
}
