//! Intent classification and execution-trigger detection.
//!
//! [`IntentClassifier`] maps an utterance to exactly one [`ActionCategory`]
//! by testing keyword rules in a fixed priority order; the first satisfied
//! rule wins. Rules are data built from [`IntentConfig`], never nested
//! conditionals.
//!
//! [`ExecutionTriggers`] is a separate check deciding whether a matched
//! category may actually run a side-effecting tool or only earns a
//! suggestion.

use std::fmt;

use serde::Serialize;

use crate::config::IntentConfig;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The closed set of actions a turn can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Create a calendar event.
    Calendar,
    /// Send or search mail.
    Email,
    /// Create or list tasks.
    Task,
    /// Look up calendar events.
    CalendarSearch,
    /// No actionable intent.
    None,
}

impl ActionCategory {
    /// Categories in the order they are tested. `None` is the fallthrough.
    pub const PRIORITY: [ActionCategory; 4] = [
        ActionCategory::Calendar,
        ActionCategory::Email,
        ActionCategory::Task,
        ActionCategory::CalendarSearch,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Email => "email",
            Self::Task => "task",
            Self::CalendarSearch => "calendar_search",
            Self::None => "none",
        }
    }

    /// Whether every action in this category is a read.
    ///
    /// Email and Task may still plan a read (search, listing) per turn; the
    /// dispatcher reports that on the planned call.
    pub fn is_read_only_by_default(self) -> bool {
        matches!(self, Self::CalendarSearch)
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Phrase matching
// ---------------------------------------------------------------------------

/// Find `phrase` in `haystack` starting on a word boundary.
///
/// With `whole_word`, the match must also end on a boundary.
pub(crate) fn contains_bounded(haystack: &str, phrase: &str, whole_word: bool) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack.match_indices(phrase).any(|(start, matched)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let end = start.saturating_add(matched.len());
        let after_ok = !whole_word
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// One row of the priority table.
#[derive(Debug, Clone)]
struct Rule {
    category: ActionCategory,
    /// Any keyword (substring) satisfies the rule.
    keywords: Vec<String>,
    /// Any of these, as whole words, vetoes the rule.
    unless: Vec<String>,
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
            && !self
                .unless
                .iter()
                .any(|cue| contains_bounded(lowered, cue, true))
    }
}

/// Keyword-table intent classifier.
///
/// `classify` is a pure function of the lowercased utterance.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<Rule>,
}

impl IntentClassifier {
    /// Build the priority table from configuration.
    ///
    /// Listing cues veto the calendar creation rule, so "what meetings do I
    /// have" falls through to [`ActionCategory::CalendarSearch`].
    pub fn from_config(config: &IntentConfig) -> Self {
        let rules = ActionCategory::PRIORITY
            .iter()
            .map(|&category| {
                let (keywords, unless) = match category {
                    ActionCategory::Calendar => (
                        lowered(&config.calendar),
                        lowered(&config.calendar_listing_cues),
                    ),
                    ActionCategory::Email => (lowered(&config.email), Vec::new()),
                    ActionCategory::Task => (lowered(&config.task), Vec::new()),
                    ActionCategory::CalendarSearch => {
                        (lowered(&config.calendar_search), Vec::new())
                    }
                    ActionCategory::None => (Vec::new(), Vec::new()),
                };
                Rule {
                    category,
                    keywords,
                    unless,
                }
            })
            .collect();
        Self { rules }
    }

    /// Classify an utterance. Always returns a category.
    pub fn classify(&self, utterance: &str) -> ActionCategory {
        let lowered = utterance.to_lowercase();
        let category = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(ActionCategory::None, |rule| rule.category);
        tracing::debug!(category = %category, "classified utterance");
        category
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Execution triggers
// ---------------------------------------------------------------------------

/// Vocabulary deciding whether an utterance asks for an action now.
#[derive(Debug, Clone)]
pub struct ExecutionTriggers {
    confirmations: Vec<String>,
    imperative_leads: Vec<String>,
    polite_prefixes: Vec<String>,
}

impl ExecutionTriggers {
    /// Build the trigger vocabulary from configuration.
    pub fn from_config(config: &IntentConfig) -> Self {
        Self {
            confirmations: lowered(&config.confirmations),
            imperative_leads: lowered(&config.imperative_leads),
            polite_prefixes: lowered(&config.polite_prefixes),
        }
    }

    /// True when the utterance confirms or commands an action.
    ///
    /// Confirmations match anywhere as whole words ("yes", "go ahead").
    /// Imperative leads match only at the start, after any politeness
    /// openers ("please", "can you") are skipped.
    pub fn is_triggered(&self, utterance: &str) -> bool {
        let lowered = utterance.to_lowercase();
        if self
            .confirmations
            .iter()
            .any(|c| contains_bounded(&lowered, c, true))
        {
            return true;
        }

        let command = self.strip_politeness(&lowered);
        self.imperative_leads
            .iter()
            .any(|lead| command.starts_with(lead.as_str()) && contains_bounded(command, lead, true))
    }

    fn strip_politeness<'a>(&self, lowered: &'a str) -> &'a str {
        let mut rest = lowered.trim_start_matches(|c: char| !c.is_alphanumeric());
        loop {
            let stripped = self.polite_prefixes.iter().find_map(|prefix| {
                let after = rest.strip_prefix(prefix.as_str())?;
                if after.chars().next().is_some_and(char::is_alphanumeric) {
                    return None;
                }
                Some(after.trim_start_matches(|c: char| !c.is_alphanumeric()))
            });
            match stripped {
                Some(next) => rest = next,
                None => return rest,
            }
        }
    }
}

impl Default for ExecutionTriggers {
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}
