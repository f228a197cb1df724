//! Tool dispatch: plan a call, resolve implicit context, invoke once,
//! classify the outcome.
//!
//! Faults never leave this module as `Err`. Every service error becomes a
//! [`ToolOutcome::Failure`] tagged with an [`ErrorKind`] that drives the
//! remediation text.

pub mod catalog;
pub mod plan;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

pub use catalog::{ActionSemantics, Tool, ToolCall};
pub use plan::{plan, PlanContext, DEFAULT_TASK_LIST, PRIMARY_CALENDAR};

use crate::intent::ActionCategory;
use crate::mcp::{ToolResult, ToolService, ToolServiceError};
use crate::slots::SlotSet;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Fault classes surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The account has not granted the needed permission.
    AuthRequired,
    /// The referenced resource does not exist.
    NotFound,
    /// Anything else.
    Generic,
}

impl ErrorKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::NotFound => "not_found",
            Self::Generic => "generic",
        }
    }
}

/// Classify a fault by its message text.
///
/// "authentication" or "unauthorized" → `AuthRequired`; "not found" →
/// `NotFound`; otherwise `Generic`. Case-insensitive; auth wins when both
/// appear.
pub fn classify_fault(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    if lowered.contains("authentication") || lowered.contains("unauthorized") {
        ErrorKind::AuthRequired
    } else if lowered.contains("not found") {
        ErrorKind::NotFound
    } else {
        ErrorKind::Generic
    }
}

/// Result of one dispatch, consumed once by the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool ran; raw result attached.
    Success(ToolResult),
    /// The call failed.
    Failure {
        /// Classified fault.
        kind: ErrorKind,
        /// Raw fault text.
        message: String,
    },
}

impl ToolOutcome {
    /// Convert a service response, classifying any fault.
    pub fn from_service(result: Result<ToolResult, ToolServiceError>) -> Self {
        match result {
            Ok(result) => Self::Success(result),
            Err(err) => {
                let message = err.to_string();
                Self::Failure {
                    kind: classify_fault(&message),
                    message,
                }
            }
        }
    }

    /// Whether the tool ran successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Everything the formatter needs about one executed action.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Category the turn resolved to.
    pub category: ActionCategory,
    /// The call issued.
    pub call: ToolCall,
    /// What came back.
    pub outcome: ToolOutcome,
}

// ---------------------------------------------------------------------------
// Task list resolution
// ---------------------------------------------------------------------------

static LIST_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\(ID:\s*([^)]+)\)").ok());

/// First `(ID: …)` in a task-list listing.
pub fn extract_task_list_id(listing: &str) -> Option<String> {
    let caps = LIST_ID.as_ref()?.captures(listing)?;
    let id = caps[1].trim();
    (!id.is_empty()).then(|| id.to_owned())
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Executes planned calls against the tool service.
///
/// Holds no per-turn state; the default task list is looked up on every
/// task dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn ToolService>,
}

impl Dispatcher {
    /// Create a dispatcher over `service`.
    pub fn new(service: Arc<dyn ToolService>) -> Self {
        Self { service }
    }

    /// Plan and execute the action for `category`. `None` when the category
    /// has no action.
    pub async fn dispatch(
        &self,
        category: ActionCategory,
        slots: &SlotSet,
        ctx: &PlanContext<'_>,
    ) -> Option<Dispatch> {
        let call = plan(category, slots, ctx)?;
        Some(self.execute(category, call).await)
    }

    /// Execute an already planned call exactly once.
    #[instrument(skip(self, call), fields(category = %category, tool = call.tool_name()))]
    pub async fn execute(&self, category: ActionCategory, call: ToolCall) -> Dispatch {
        let call = match call.tool() {
            Tool::ListTasks | Tool::CreateTask => {
                let list_id = self.resolve_task_list(call.caller_identity()).await;
                call.with_argument("task_list_id", Value::String(list_id))
            }
            _ => call,
        };

        let result = self
            .service
            .call(call.tool_name(), call.arguments().clone(), call.caller_identity())
            .await;
        let outcome = ToolOutcome::from_service(result);

        match &outcome {
            ToolOutcome::Success(_) => info!(side_effects = call.tool().has_side_effects(), "tool call succeeded"),
            ToolOutcome::Failure { kind, message } => {
                warn!(kind = kind.as_str(), error = %message, "tool call failed");
            }
        }

        Dispatch {
            category,
            call,
            outcome,
        }
    }

    /// Id of the caller's first task list, or [`DEFAULT_TASK_LIST`].
    async fn resolve_task_list(&self, caller_identity: &str) -> String {
        let lookup = ToolCall::new(
            Tool::ListTaskLists,
            caller_identity,
            [("max_results", Some(json!(10)))],
        );
        match self
            .service
            .call(lookup.tool_name(), lookup.arguments().clone(), caller_identity)
            .await
        {
            Ok(result) => match extract_task_list_id(&result.as_text()) {
                Some(id) => id,
                None => {
                    warn!("no task list id in listing, using default list");
                    DEFAULT_TASK_LIST.to_owned()
                }
            },
            Err(err) => {
                warn!(error = %err, "task list lookup failed, using default list");
                DEFAULT_TASK_LIST.to_owned()
            }
        }
    }
}
