//! Remote tool catalog and validated call records.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::mcp::ToolArguments;

/// Whether an operation reads or changes remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSemantics {
    /// Pure lookup.
    Read,
    /// Creates a resource. Not idempotent.
    Write,
}

/// Remote operations the engine can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Create a calendar event.
    CreateEvent,
    /// List calendar events in a window.
    GetEvents,
    /// Send a mail message.
    SendGmailMessage,
    /// Search mail.
    SearchGmailMessages,
    /// List the caller's task lists.
    ListTaskLists,
    /// List tasks in a list.
    ListTasks,
    /// Create a task.
    CreateTask,
}

impl Tool {
    /// Every tool, in catalog order.
    pub const ALL: [Tool; 7] = [
        Tool::CreateEvent,
        Tool::GetEvents,
        Tool::SendGmailMessage,
        Tool::SearchGmailMessages,
        Tool::ListTaskLists,
        Tool::ListTasks,
        Tool::CreateTask,
    ];

    /// Name the remote service knows the tool by.
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateEvent => "create_event",
            Self::GetEvents => "get_events",
            Self::SendGmailMessage => "send_gmail_message",
            Self::SearchGmailMessages => "search_gmail_messages",
            Self::ListTaskLists => "list_task_lists",
            Self::ListTasks => "list_tasks",
            Self::CreateTask => "create_task",
        }
    }

    /// Look a tool up by its remote name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Argument names the tool accepts. The caller identity is injected by
    /// the transport and is not listed.
    pub fn accepted_args(self) -> &'static [&'static str] {
        match self {
            Self::CreateEvent => &[
                "calendar_id",
                "summary",
                "start_time",
                "end_time",
                "timezone",
                "description",
                "attendees",
            ],
            Self::GetEvents => &["calendar_id", "time_min", "time_max", "max_results"],
            Self::SendGmailMessage => &["to", "subject", "body"],
            Self::SearchGmailMessages => &["query", "page_size"],
            Self::ListTaskLists => &["max_results"],
            Self::ListTasks => &["task_list_id", "max_results"],
            Self::CreateTask => &["task_list_id", "title", "notes", "due"],
        }
    }

    /// Read or write.
    pub fn semantics(self) -> ActionSemantics {
        match self {
            Self::CreateEvent | Self::SendGmailMessage | Self::CreateTask => ActionSemantics::Write,
            Self::GetEvents | Self::SearchGmailMessages | Self::ListTaskLists | Self::ListTasks => {
                ActionSemantics::Read
            }
        }
    }

    /// Whether calling the tool creates something.
    pub fn has_side_effects(self) -> bool {
        self.semantics() == ActionSemantics::Write
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated invocation. Only accepted arguments survive construction;
/// the record is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    tool: Tool,
    arguments: ToolArguments,
    caller_identity: String,
}

impl ToolCall {
    /// Build a call, dropping unknown and absent arguments.
    pub fn new<I>(tool: Tool, caller_identity: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Option<Value>)>,
    {
        let accepted = tool.accepted_args();
        let mut map = ToolArguments::new();
        for (key, value) in arguments {
            match value {
                Some(value) if accepted.contains(&key) => {
                    map.insert(key.to_owned(), value);
                }
                Some(_) => {
                    tracing::debug!(tool = %tool, arg = key, "dropping argument the tool does not accept");
                }
                None => {}
            }
        }
        Self {
            tool,
            arguments: map,
            caller_identity: caller_identity.into(),
        }
    }

    /// Copy of this call with one argument replaced, subject to the same
    /// filtering.
    pub(crate) fn with_argument(&self, key: &'static str, value: Value) -> Self {
        let mut next = self.clone();
        if self.tool.accepted_args().contains(&key) {
            next.arguments.insert(key.to_owned(), value);
        }
        next
    }

    /// The tool invoked.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Remote tool name.
    pub fn tool_name(&self) -> &'static str {
        self.tool.name()
    }

    /// Arguments as sent.
    pub fn arguments(&self) -> &ToolArguments {
        &self.arguments
    }

    /// One argument, if present.
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// One string argument, if present.
    pub fn str_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Account the call is made for.
    pub fn caller_identity(&self) -> &str {
        &self.caller_identity
    }
}
