//! Slot extraction: structured values pulled out of free text.
//!
//! Every extractor is an ordered list of pure rules tried with
//! [`first_match`]. A miss yields `None`; defaults are applied by the
//! caller, so extraction never fails a turn.

pub mod datetime;
pub mod email;
pub mod query;
pub mod task;
pub mod timezone;
pub mod title;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::{IntentConfig, SchedulingConfig};
use crate::intent::ActionCategory;

/// A single extraction rule.
pub type Rule<T> = fn(&str) -> Option<T>;

/// Try `rules` in order and return the first hit.
pub fn first_match<T>(text: &str, rules: &[Rule<T>]) -> Option<T> {
    rules.iter().find_map(|rule| rule(text))
}

/// Values extracted for one turn. Absent slots are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotSet {
    /// Event summary or task title.
    pub title: Option<String>,
    /// Event start, or the first day of a calendar lookup (local wall time).
    pub start_time: Option<NaiveDateTime>,
    /// Event end (local wall time).
    pub end_time: Option<NaiveDateTime>,
    /// Mail recipient.
    pub to: Option<String>,
    /// Mail subject.
    pub subject: Option<String>,
    /// Mail body.
    pub body: Option<String>,
    /// Mail search query.
    pub query: Option<String>,
    /// Task due date.
    pub due: Option<NaiveDate>,
    /// The user asked to see existing items rather than create one.
    pub wants_listing: bool,
}

/// Inputs shared by every extractor for a turn.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// The turn's "now" in the resolved zone.
    pub now: DateTime<Tz>,
    /// Event defaults.
    pub scheduling: &'a SchedulingConfig,
    /// Listing cues and other vocabulary.
    pub intent: &'a IntentConfig,
}

/// Run the extractors owned by `category`.
pub fn extract(category: ActionCategory, utterance: &str, ctx: &ExtractionContext<'_>) -> SlotSet {
    let mut slots = SlotSet::default();
    match category {
        ActionCategory::Calendar => {
            slots.title = title::event_title(utterance);
            slots.start_time = datetime::extract_datetime(utterance, ctx.now, ctx.scheduling);
            slots.end_time = slots
                .start_time
                .and_then(|start| datetime::extract_range_end(utterance, start));
        }
        ActionCategory::CalendarSearch => {
            let today = ctx.now.date_naive();
            slots.start_time = datetime::extract_date(utterance, today)
                .filter(|day| *day != today)
                .and_then(|day| day.and_hms_opt(0, 0, 0));
        }
        ActionCategory::Email => {
            let fields = email::extract_fields(utterance);
            slots.to = fields.to;
            slots.subject = fields.subject;
            slots.body = fields.body;
            slots.query = Some(query::search_query(utterance));
        }
        ActionCategory::Task => {
            slots.wants_listing = task::wants_listing(utterance, &ctx.intent.task_listing_cues);
            if !slots.wants_listing {
                slots.title = Some(task::title(utterance));
                slots.due = datetime::extract_date(utterance, ctx.now.date_naive());
            }
        }
        ActionCategory::None => {}
    }
    tracing::debug!(category = %category, ?slots, "extracted slots");
    slots
}
