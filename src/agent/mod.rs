//! Conversation orchestrator.
//!
//! Owns one turn: resolves the caller's zone, classifies the utterance,
//! extracts slots, plans the call, and in parallel asks the language model
//! for a conversational reply. If an action runs, its formatted outcome is
//! the whole reply; otherwise the model's text is returned, with
//! suggestions appended when a category matched.
//!
//! All collaborators arrive through [`EngineContext`]; the orchestrator holds
//! nothing that changes between turns.

pub mod context;
pub mod suggest;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::RituoConfig;
use crate::dispatch::{plan, Dispatch, Dispatcher, PlanContext, ToolCall};
use crate::format;
use crate::intent::{ActionCategory, ExecutionTriggers, IntentClassifier};
use crate::mcp::ToolService;
use crate::providers::{ApiCredential, CompletionRequest, LlmProvider, Message, ProviderError};
use crate::slots::timezone::{resolve_timezone, TimezoneSources};
use crate::slots::{extract, ExtractionContext, SlotSet};

pub use crate::slots::timezone::ZoneProbe;

/// Reply when the caller supplied no model credential.
pub const MISSING_CREDENTIAL_REPLY: &str =
    "I can't chat right now because no API key was provided for the language model. \
     Calendar, mail and task actions still work.";

/// Reply when the model call fails.
pub const PROVIDER_FAILURE_REPLY: &str =
    "Sorry, I couldn't reach the language model just now. Please try again in a moment.";

/// Reply when the model returns nothing usable.
pub const EMPTY_REPLY: &str = "I'm not sure how to answer that. Could you rephrase?";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Shared collaborators, built once at startup.
#[derive(Clone)]
pub struct EngineContext {
    /// Remote tool-execution service.
    pub tools: Arc<dyn ToolService>,
    /// Language-model backend.
    pub llm: Arc<dyn LlmProvider>,
    /// Loaded configuration.
    pub config: Arc<RituoConfig>,
    /// Host zone discovery.
    pub zone_probe: ZoneProbe,
}

/// Who the turn is for.
#[derive(Debug, Clone)]
pub struct CallerContext {
    /// Account identifier (email) tool calls act on.
    pub identity: String,
    /// Display name for the prompt.
    pub name: Option<String>,
    /// Model API key supplied by the caller.
    pub credential: Option<ApiCredential>,
    /// Caller's IANA zone, overriding the configured profile.
    pub timezone: Option<String>,
}

impl CallerContext {
    /// Caller with only an identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            name: None,
            credential: None,
            timezone: None,
        }
    }
}

/// One user message and what it is interpreted against.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    /// The user's message.
    pub utterance: &'a str,
    /// Prior messages, oldest first.
    pub history: &'a [Message],
    /// The caller.
    pub caller: &'a CallerContext,
    /// Wall-clock instant of the turn.
    pub now: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Everything decided about a turn before any I/O.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Chosen category.
    pub category: ActionCategory,
    /// Whether the utterance confirms or commands.
    pub triggered: bool,
    /// Extracted slots.
    pub slots: SlotSet,
    /// The call that would be made.
    pub call: Option<ToolCall>,
    /// Whether the call will run this turn.
    pub executes: bool,
    /// Zone used for time resolution.
    #[serde(serialize_with = "serialize_zone")]
    pub zone: Tz,
}

fn serialize_zone<S: serde::Serializer>(zone: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(zone.name())
}

/// Final answer for a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Text shown to the user. Never empty.
    pub text: String,
    /// Category the turn resolved to.
    pub category: ActionCategory,
    /// The executed action, if any.
    pub dispatch: Option<Dispatch>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs turns. Cheap to share; holds no mutable state.
pub struct Orchestrator {
    ctx: EngineContext,
    classifier: IntentClassifier,
    triggers: ExecutionTriggers,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    /// Build the orchestrator and its rule tables from `ctx.config`.
    pub fn new(ctx: EngineContext) -> Self {
        let classifier = IntentClassifier::from_config(&ctx.config.intent);
        let triggers = ExecutionTriggers::from_config(&ctx.config.intent);
        let dispatcher = Dispatcher::new(Arc::clone(&ctx.tools));
        Self {
            ctx,
            classifier,
            triggers,
            dispatcher,
        }
    }

    /// Zone for `caller`: caller zone, config profile, host, offset table, UTC.
    pub fn resolve_zone(&self, caller: &CallerContext) -> Tz {
        let tz_config = &self.ctx.config.timezone;
        let profile = caller
            .timezone
            .as_deref()
            .or(tz_config.profile.as_deref());
        resolve_timezone(&TimezoneSources {
            profile,
            probe: &self.ctx.zone_probe,
            offsets: &tz_config.offsets,
        })
    }

    /// Classify, extract and plan without contacting any service.
    pub fn resolve(&self, utterance: &str, caller: &CallerContext, now: DateTime<Utc>) -> Resolution {
        let zone = self.resolve_zone(caller);
        let now_local = now.with_timezone(&zone);
        let config = &self.ctx.config;

        let category = self.classifier.classify(utterance);
        let triggered = self.triggers.is_triggered(utterance);
        let slots = extract(
            category,
            utterance,
            &ExtractionContext {
                now: now_local,
                scheduling: &config.scheduling,
                intent: &config.intent,
            },
        );
        let call = plan(
            category,
            &slots,
            &PlanContext {
                now: now_local,
                zone,
                scheduling: &config.scheduling,
                caller_identity: &caller.identity,
            },
        );
        // Reads need no trigger; writes do.
        let executes = call
            .as_ref()
            .is_some_and(|c| triggered || !c.tool().has_side_effects());

        Resolution {
            category,
            triggered,
            slots,
            call,
            executes,
            zone,
        }
    }

    /// Run one turn to a non-empty reply.
    #[instrument(skip_all, fields(caller = %turn.caller.identity))]
    pub async fn handle_turn(&self, turn: Turn<'_>) -> Reply {
        let resolution = self.resolve(turn.utterance, turn.caller, turn.now);
        info!(
            category = %resolution.category,
            triggered = resolution.triggered,
            executes = resolution.executes,
            "resolved turn"
        );

        let category = resolution.category;
        let pending = resolution.call.filter(|_| resolution.executes);
        let action = async {
            match pending {
                Some(call) => Some(self.dispatcher.execute(category, call).await),
                None => None,
            }
        };
        let (conversational, dispatch) =
            tokio::join!(self.conversational_reply(&turn, resolution.zone), action);

        let text = match &dispatch {
            Some(dispatch) => format::format(dispatch),
            None => suggest::append_suggestions(&conversational, category, turn.utterance),
        };
        let text = if text.trim().is_empty() {
            EMPTY_REPLY.to_owned()
        } else {
            text
        };

        Reply {
            text,
            category,
            dispatch,
        }
    }

    async fn conversational_reply(&self, turn: &Turn<'_>, zone: Tz) -> String {
        match self.complete(turn, zone).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("language model returned an empty reply");
                EMPTY_REPLY.to_owned()
            }
            Err(ProviderError::MissingCredential) => {
                warn!("no model credential supplied, skipping conversational reply");
                MISSING_CREDENTIAL_REPLY.to_owned()
            }
            Err(err) => {
                warn!(error = %err, "language model request failed");
                PROVIDER_FAILURE_REPLY.to_owned()
            }
        }
    }

    async fn complete(&self, turn: &Turn<'_>, zone: Tz) -> Result<String, ProviderError> {
        let credential = turn
            .caller
            .credential
            .as_ref()
            .ok_or(ProviderError::MissingCredential)?;
        let config = &self.ctx.config;

        let system_prompt = context::assemble_system_prompt(&context::PromptFacts {
            assistant_name: &config.conversation.assistant_name,
            user_name: turn.caller.name.as_deref(),
            user_identity: &turn.caller.identity,
            now: turn.now.with_timezone(&zone),
        });
        let messages = context::build_messages(
            system_prompt,
            turn.history,
            turn.utterance,
            config.conversation.history_limit,
        );

        let response = self
            .ctx
            .llm
            .complete(
                CompletionRequest {
                    messages,
                    max_tokens: Some(config.llm.max_tokens),
                },
                credential,
            )
            .await?;
        Ok(response.text)
    }
}
