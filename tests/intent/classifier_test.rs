//! Tests for keyword-table classification and priority order.

use rituo::config::IntentConfig;
use rituo::intent::{ActionCategory, IntentClassifier};

fn classifier() -> IntentClassifier {
    IntentClassifier::default()
}

// ---------------------------------------------------------------------------
// Single-category utterances
// ---------------------------------------------------------------------------

#[test]
fn creation_phrases_are_calendar() {
    let c = classifier();
    assert_eq!(
        c.classify("Schedule meeting with Sam tomorrow at 2pm"),
        ActionCategory::Calendar
    );
    assert_eq!(c.classify("book a dentist appointment"), ActionCategory::Calendar);
}

#[test]
fn mail_phrases_are_email() {
    let c = classifier();
    assert_eq!(
        c.classify("send email to a@b.com saying \"hi there\""),
        ActionCategory::Email
    );
    assert_eq!(c.classify("check my inbox"), ActionCategory::Email);
}

#[test]
fn task_phrases_are_task() {
    let c = classifier();
    assert_eq!(c.classify("add a task to buy milk"), ActionCategory::Task);
    assert_eq!(c.classify("remind me to call mom"), ActionCategory::Task);
}

#[test]
fn calendar_lookups_are_calendar_search() {
    let c = classifier();
    assert_eq!(c.classify("what's on my calendar"), ActionCategory::CalendarSearch);
    assert_eq!(c.classify("am I busy on friday"), ActionCategory::CalendarSearch);
}

#[test]
fn small_talk_is_none() {
    let c = classifier();
    for utterance in ["hello there", "tell me a joke", "", "   ", "how are you?"] {
        assert_eq!(c.classify(utterance), ActionCategory::None, "{utterance:?}");
    }
}

// ---------------------------------------------------------------------------
// Priority and listing precedence
// ---------------------------------------------------------------------------

#[test]
fn two_category_match_resolves_to_higher_priority_deterministically() {
    let c = classifier();
    let utterance = "schedule a meeting and email the notes";
    let first = c.classify(utterance);
    assert_eq!(first, ActionCategory::Calendar);
    for _ in 0..10 {
        assert_eq!(c.classify(utterance), first);
    }
}

#[test]
fn email_outranks_task() {
    assert_eq!(
        classifier().classify("email bob a reminder about the task"),
        ActionCategory::Email
    );
}

#[test]
fn listing_cues_veto_calendar_creation() {
    let c = classifier();
    assert_eq!(
        c.classify("what meetings do I have tomorrow"),
        ActionCategory::CalendarSearch
    );
    assert_eq!(
        c.classify("show my upcoming meetings"),
        ActionCategory::CalendarSearch
    );
}

#[test]
fn listing_cue_prefixes_inside_words_do_not_veto() {
    let c = classifier();
    for utterance in [
        "schedule a checkup with Dr Lee tomorrow at 3pm",
        "book a showing of the flat tomorrow",
        "schedule a meeting to listen to the pitch",
    ] {
        assert_eq!(c.classify(utterance), ActionCategory::Calendar, "{utterance:?}");
    }
}

#[test]
fn classification_is_case_insensitive() {
    let c = classifier();
    assert_eq!(c.classify("SCHEDULE A CALL"), c.classify("schedule a call"));
}

#[test]
fn category_names_are_stable() {
    assert_eq!(ActionCategory::Calendar.as_str(), "calendar");
    assert_eq!(ActionCategory::CalendarSearch.as_str(), "calendar_search");
    assert_eq!(ActionCategory::None.to_string(), "none");
}

#[test]
fn priority_order_is_fixed() {
    assert_eq!(
        ActionCategory::PRIORITY,
        [
            ActionCategory::Calendar,
            ActionCategory::Email,
            ActionCategory::Task,
            ActionCategory::CalendarSearch,
        ]
    );
}

// ---------------------------------------------------------------------------
// Config-driven tables
// ---------------------------------------------------------------------------

#[test]
fn custom_keywords_replace_defaults() {
    let config = IntentConfig {
        task: vec!["chore".to_owned()],
        ..IntentConfig::default()
    };
    let c = IntentClassifier::from_config(&config);
    assert_eq!(c.classify("new chore: vacuum"), ActionCategory::Task);
    assert_eq!(c.classify("add a todo"), ActionCategory::None);
}

#[test]
fn keywords_are_normalised_to_lowercase() {
    let config = IntentConfig {
        email: vec!["  Outlook ".to_owned()],
        ..IntentConfig::default()
    };
    let c = IntentClassifier::from_config(&config);
    assert_eq!(c.classify("open outlook"), ActionCategory::Email);
}

#[test]
fn only_calendar_search_is_read_only_by_default() {
    assert!(ActionCategory::CalendarSearch.is_read_only_by_default());
    assert!(!ActionCategory::Calendar.is_read_only_by_default());
    assert!(!ActionCategory::Email.is_read_only_by_default());
}
