//! Tests for full turns through the orchestrator with fake collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use rituo::agent::suggest::suggestion;
use rituo::agent::{
    CallerContext, EngineContext, Orchestrator, Turn, ZoneProbe, EMPTY_REPLY,
    MISSING_CREDENTIAL_REPLY, PROVIDER_FAILURE_REPLY,
};
use rituo::config::RituoConfig;
use rituo::dispatch::Tool;
use rituo::intent::ActionCategory;
use rituo::mcp::{ToolArguments, ToolDescriptor, ToolResult, ToolService, ToolServiceError};
use rituo::providers::{
    ApiCredential, CompletionRequest, CompletionResponse, LlmProvider, Message, ProviderError,
    Role,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingTools {
    calls: Mutex<Vec<(String, ToolArguments)>>,
}

impl RecordingTools {
    fn names(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ToolService for RecordingTools {
    async fn call(
        &self,
        tool_name: &str,
        arguments: ToolArguments,
        _caller_identity: &str,
    ) -> Result<ToolResult, ToolServiceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((tool_name.to_owned(), arguments));
        let text = match tool_name {
            "create_event" => "Successfully created event. Link: https://calendar.google.com/event?eid=1",
            "list_task_lists" => "- My Tasks (ID: L1)",
            "create_task" => "Created task 'Buy milk' (ID: tk1)",
            _ => "No events found.",
        };
        Ok(ToolResult::Text(text.to_owned()))
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        Ok(Vec::new())
    }
}

#[derive(Clone, Copy)]
enum Script {
    Reply(&'static str),
    Fail,
}

struct ScriptedLlm {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        request: CompletionRequest,
        _credential: &ApiCredential,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().expect("requests lock").push(request);
        match self.script {
            Script::Reply(text) => Ok(CompletionResponse {
                text: text.to_owned(),
                model: "test/mock".to_owned(),
            }),
            Script::Fail => Err(ProviderError::HttpStatus {
                status: 503,
                body: "overloaded".to_owned(),
            }),
        }
    }

    fn model_id(&self) -> &str {
        "test/mock"
    }
}

struct Harness {
    orchestrator: Orchestrator,
    tools: Arc<RecordingTools>,
    llm: Arc<ScriptedLlm>,
}

fn harness(script: Script) -> Harness {
    let tools = Arc::new(RecordingTools::default());
    let llm = ScriptedLlm::new(script);
    let orchestrator = Orchestrator::new(EngineContext {
        tools: tools.clone(),
        llm: llm.clone(),
        config: Arc::new(RituoConfig::default()),
        zone_probe: ZoneProbe::Fixed {
            zone: Some("UTC".to_owned()),
            offset_seconds: Some(0),
        },
    });
    Harness {
        orchestrator,
        tools,
        llm,
    }
}

fn caller_with_key() -> CallerContext {
    CallerContext {
        credential: ApiCredential::new("test-key"),
        ..CallerContext::new("me@example.com")
    }
}

fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("fixed instant")
}

fn turn<'a>(utterance: &'a str, history: &'a [Message], caller: &'a CallerContext) -> Turn<'a> {
    Turn {
        utterance,
        history,
        caller,
        now: monday_morning(),
    }
}

// ---------------------------------------------------------------------------
// Action turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn executed_action_replaces_conversational_text() {
    let h = harness(Script::Reply("Sure, I'll set that up!"));
    let caller = caller_with_key();

    let reply = h
        .orchestrator
        .handle_turn(turn("schedule meeting with Sam tomorrow at 2pm", &[], &caller))
        .await;

    assert_eq!(reply.category, ActionCategory::Calendar);
    assert_eq!(h.tools.names(), vec!["create_event".to_owned()]);
    assert!(reply.text.starts_with("Event created: Meeting with Sam"));
    assert!(!reply.text.contains("set that up"));
    let dispatch = reply.dispatch.expect("action executed");
    assert_eq!(dispatch.call.tool(), Tool::CreateEvent);
    assert_eq!(
        dispatch.call.str_argument("start_time"),
        Some("2024-01-02T14:00:00")
    );
}

#[tokio::test]
async fn untriggered_write_only_suggests() {
    let h = harness(Script::Reply("That sounds like a plan."));
    let caller = caller_with_key();

    let reply = h
        .orchestrator
        .handle_turn(turn("I might need a meeting with Sam tomorrow", &[], &caller))
        .await;

    assert_eq!(reply.category, ActionCategory::Calendar);
    assert!(h.tools.names().is_empty());
    assert!(reply.dispatch.is_none());
    assert!(reply.text.starts_with("That sounds like a plan.\n\nAvailable actions:\n- "));
}

/// The quoted example at the end of a suggestion.
fn suggested_phrase(text: &str) -> &str {
    text.rsplit_once("like \"")
        .and_then(|(_, rest)| rest.strip_suffix("\"."))
        .expect("suggestion ends with a quoted example")
}

#[tokio::test]
async fn suggested_phrasings_execute_on_their_own() {
    let cases = [
        (ActionCategory::Calendar, "i'd like a meeting with Sam tomorrow at 2pm", "create_event"),
        (ActionCategory::Email, "maybe write sam@example.com an email saying hi", "send_gmail_message"),
        (ActionCategory::Task, "a task for the groceries maybe", "create_task"),
    ];
    let caller = caller_with_key();

    for (category, hesitant, tool) in cases {
        let h = harness(Script::Reply("Sounds good."));
        let first = h.orchestrator.handle_turn(turn(hesitant, &[], &caller)).await;
        assert_eq!(first.category, category, "{hesitant:?}");
        assert!(first.dispatch.is_none(), "{hesitant:?}");

        let hint = suggestion(category, hesitant).expect("matched category has a suggestion");
        assert!(first.text.contains(hint));
        let phrase = suggested_phrase(hint);

        let history = [
            Message::new(Role::User, hesitant),
            Message::new(Role::Assistant, first.text.clone()),
        ];
        let second = h.orchestrator.handle_turn(turn(phrase, &history, &caller)).await;
        assert_eq!(second.category, category, "{phrase:?}");
        let dispatch = second.dispatch.expect("suggested phrasing executes");
        assert_eq!(dispatch.call.tool_name(), tool, "{phrase:?}");
    }
}

#[tokio::test]
async fn bare_go_ahead_has_nothing_to_confirm() {
    let h = harness(Script::Reply("What should I go ahead with?"));
    let caller = caller_with_key();

    let reply = h.orchestrator.handle_turn(turn("go ahead", &[], &caller)).await;

    assert_eq!(reply.category, ActionCategory::None);
    assert!(reply.dispatch.is_none());
    assert!(h.tools.names().is_empty());
}

#[tokio::test]
async fn reads_run_without_a_trigger() {
    let h = harness(Script::Reply("unused"));
    let caller = caller_with_key();

    let reply = h
        .orchestrator
        .handle_turn(turn("what's on my calendar", &[], &caller))
        .await;

    assert_eq!(reply.category, ActionCategory::CalendarSearch);
    assert_eq!(h.tools.names(), vec!["get_events".to_owned()]);
    assert_eq!(reply.text, "No events found.");
}

#[tokio::test]
async fn task_turn_resolves_list_then_creates() {
    let h = harness(Script::Reply("unused"));
    let caller = caller_with_key();

    let reply = h
        .orchestrator
        .handle_turn(turn("please add a task to buy milk", &[], &caller))
        .await;

    assert_eq!(
        h.tools.names(),
        vec!["list_task_lists".to_owned(), "create_task".to_owned()]
    );
    assert_eq!(reply.text, "Task created: Buy milk\nID: tk1");
}

// ---------------------------------------------------------------------------
// Conversational turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn small_talk_returns_model_text() {
    let h = harness(Script::Reply("Hello! How can I help?"));
    let caller = caller_with_key();

    let reply = h.orchestrator.handle_turn(turn("hello", &[], &caller)).await;

    assert_eq!(reply.category, ActionCategory::None);
    assert_eq!(reply.text, "Hello! How can I help?");
    assert!(h.tools.names().is_empty());
}

#[tokio::test]
async fn missing_credential_still_dispatches() {
    let h = harness(Script::Reply("unused"));
    let caller = CallerContext::new("me@example.com");

    let reply = h
        .orchestrator
        .handle_turn(turn("schedule meeting with Sam tomorrow at 2pm", &[], &caller))
        .await;
    assert!(reply.text.starts_with("Event created:"));

    let chat = h.orchestrator.handle_turn(turn("hello", &[], &caller)).await;
    assert_eq!(chat.text, MISSING_CREDENTIAL_REPLY);
    assert!(h.llm.requests().is_empty());
}

#[tokio::test]
async fn provider_failure_has_fallback_text() {
    let h = harness(Script::Fail);
    let caller = caller_with_key();

    let reply = h.orchestrator.handle_turn(turn("hello", &[], &caller)).await;
    assert_eq!(reply.text, PROVIDER_FAILURE_REPLY);
}

#[tokio::test]
async fn blank_model_reply_is_replaced() {
    let h = harness(Script::Reply("   "));
    let caller = caller_with_key();

    let reply = h.orchestrator.handle_turn(turn("hello", &[], &caller)).await;
    assert_eq!(reply.text, EMPTY_REPLY);
}

#[tokio::test]
async fn model_sees_bounded_history() {
    let h = harness(Script::Reply("ok"));
    let caller = caller_with_key();
    let history: Vec<Message> = (0..30)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            Message::new(role, format!("m{i}"))
        })
        .collect();

    h.orchestrator
        .handle_turn(turn("and then?", &history, &caller))
        .await;

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "m20");
    assert_eq!(messages[11].content, "and then?");
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn caller_zone_overrides_host() {
    let h = harness(Script::Reply("unused"));
    let caller = CallerContext {
        timezone: Some("Asia/Kolkata".to_owned()),
        ..CallerContext::new("me@example.com")
    };
    assert_eq!(h.orchestrator.resolve_zone(&caller), Tz::Asia__Kolkata);
    assert_eq!(
        h.orchestrator.resolve_zone(&CallerContext::new("me@example.com")),
        Tz::UTC
    );
}

#[test]
fn resolution_serializes_for_inspection() {
    let h = harness(Script::Reply("unused"));
    let caller = CallerContext::new("me@example.com");
    let resolution =
        h.orchestrator
            .resolve("schedule meeting with Sam tomorrow at 2pm", &caller, monday_morning());

    assert!(resolution.triggered);
    assert!(resolution.executes);
    let json = serde_json::to_value(&resolution).expect("serializes");
    assert_eq!(json["category"], "calendar");
    assert_eq!(json["zone"], "UTC");
    assert_eq!(json["call"]["tool"], "create_event");
    assert_eq!(json["call"]["arguments"]["summary"], "Meeting with Sam");
}
