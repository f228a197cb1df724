//! Configuration loading and management.
//!
//! Loads Rituo configuration from `./rituo.toml` (or `$RITUO_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.
//!
//! Keyword tables, execution triggers and the UTC-offset → zone table all live
//! here so classification can be tuned without touching code.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

// ── Top-level config ────────────────────────────────────────────

/// Top-level Rituo configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RituoConfig {
    /// Logging settings (`[logging]`).
    pub logging: LoggingConfig,
    /// Remote tool-execution service (`[mcp]`).
    pub mcp: McpConfig,
    /// Language-model backend (`[llm]`).
    pub llm: LlmConfig,
    /// Conversation context settings (`[conversation]`).
    pub conversation: ConversationConfig,
    /// Intent keyword tables and execution triggers (`[intent]`).
    pub intent: IntentConfig,
    /// Event defaults and calendar search window (`[scheduling]`).
    pub scheduling: SchedulingConfig,
    /// Timezone resolution (`[timezone]`).
    pub timezone: TimezoneConfig,
}

impl RituoConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$RITUO_CONFIG_PATH` or `./rituo.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        Self::load_path(&path)
    }

    /// Load from an explicit path. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_path(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(RituoConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve config path using a custom env resolver.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        match env("RITUO_CONFIG_PATH") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("rituo.toml"),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("RITUO_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("RITUO_LOG_DIR") {
            self.logging.dir = Some(v);
        }

        if let Some(v) = env("RITUO_MCP_URL") {
            self.mcp.url = v;
        }

        if let Some(v) = env("RITUO_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = env("RITUO_LLM_MODEL") {
            self.llm.model = v;
        }

        if let Some(v) = env("RITUO_HISTORY_LIMIT") {
            match v.parse() {
                Ok(n) => self.conversation.history_limit = n,
                Err(_) => tracing::warn!(
                    var = "RITUO_HISTORY_LIMIT",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        if let Some(v) = env("RITUO_TIMEZONE") {
            self.timezone.profile = Some(v);
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrong field types.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: RituoConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Logging ─────────────────────────────────────────────────────

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs. `None` uses the platform data dir.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            dir: None,
        }
    }
}

// ── Tool service ────────────────────────────────────────────────

/// Remote tool-execution service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Streamable-HTTP endpoint of the MCP server.
    pub url: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001/mcp".to_owned(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────

/// OpenAI-compatible chat backend. The API key is caller-supplied per turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (without the `/chat/completions` suffix).
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Maximum tokens in the reply.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_owned(),
            model: "qwen/qwen3-32b".to_owned(),
            max_tokens: 1024,
        }
    }
}

// ── Conversation ────────────────────────────────────────────────

/// Conversation context settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Number of most recent history messages sent to the model.
    pub history_limit: usize,
    /// Name the assistant introduces itself with.
    pub assistant_name: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            assistant_name: "Rituo".to_owned(),
        }
    }
}

// ── Intent tables ───────────────────────────────────────────────

/// Keyword tables for classification and the execution trigger vocabulary.
///
/// Matching is case-insensitive; entries should be lowercase.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Calendar event creation keywords.
    pub calendar: Vec<String>,
    /// Listing cues that veto the calendar creation rule.
    pub calendar_listing_cues: Vec<String>,
    /// Mail keywords.
    pub email: Vec<String>,
    /// Task keywords.
    pub task: Vec<String>,
    /// Calendar lookup keywords.
    pub calendar_search: Vec<String>,
    /// Cues that turn a task request into a listing.
    pub task_listing_cues: Vec<String>,
    /// Confirmation phrases matched anywhere on word boundaries.
    pub confirmations: Vec<String>,
    /// Imperative verbs that count as a trigger when they open the utterance.
    pub imperative_leads: Vec<String>,
    /// Politeness openers skipped before checking imperative leads.
    pub polite_prefixes: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            calendar: owned(&[
                "schedule",
                "meeting",
                "appointment",
                "calendar event",
                "create event",
                "create an event",
                "add an event",
                "book",
                "set up a call",
                "add to my calendar",
                "add to calendar",
                "put on my calendar",
            ]),
            calendar_listing_cues: owned(&[
                "what's on",
                "whats on",
                "what is on",
                "what meetings",
                "what events",
                "show",
                "list",
                "check",
                "upcoming",
                "do i have",
                "any meetings",
                "agenda",
            ]),
            email: owned(&["email", "e-mail", "gmail", "inbox", "mail", "compose", "reply to"]),
            task: owned(&["task", "todo", "to-do", "reminder", "remind me"]),
            calendar_search: owned(&[
                "calendar",
                "meeting",
                "event",
                "schedule",
                "agenda",
                "appointment",
                "busy",
            ]),
            task_listing_cues: owned(&[
                "show",
                "list my",
                "list all",
                "what are my",
                "what tasks",
                "which tasks",
                "do i have",
                "pending",
                "open tasks",
            ]),
            confirmations: owned(&[
                "yes",
                "yeah",
                "yep",
                "go ahead",
                "do it",
                "execute",
                "confirm",
                "please do",
                "right away",
            ]),
            imperative_leads: owned(&[
                "schedule", "book", "create", "add", "send", "email", "remind me", "set up", "put",
                "make", "show", "list", "check", "find", "search",
            ]),
            polite_prefixes: owned(&[
                "please",
                "kindly",
                "can you",
                "could you",
                "would you",
                "will you",
                "hey",
            ]),
        }
    }
}

// ── Scheduling ──────────────────────────────────────────────────

/// Event defaults and calendar search window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Event length when no end time is given.
    pub default_event_minutes: u32,
    /// Local hour used when no time of day is given.
    pub default_hour: u32,
    /// Days covered by a calendar lookup.
    pub search_days: u32,
    /// Maximum events returned by a calendar lookup.
    pub max_results: u32,
    /// Maximum messages returned by a mail search.
    pub mail_page_size: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_event_minutes: 60,
            default_hour: 14,
            search_days: 7,
            max_results: 10,
            mail_page_size: 10,
        }
    }
}

// ── Timezone ────────────────────────────────────────────────────

/// Timezone resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Explicit IANA zone that wins over system detection.
    pub profile: Option<String>,
    /// UTC offset (`"+05:30"`, `"-05:00"`, `"+00:00"`) → IANA zone name.
    pub offsets: BTreeMap<String, String>,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        let offsets = [
            ("+00:00", "UTC"),
            ("+01:00", "Europe/Paris"),
            ("+02:00", "Europe/Athens"),
            ("+03:00", "Europe/Moscow"),
            ("+04:00", "Asia/Dubai"),
            ("+05:30", "Asia/Kolkata"),
            ("+08:00", "Asia/Singapore"),
            ("+09:00", "Asia/Tokyo"),
            ("+10:00", "Australia/Sydney"),
            ("-03:00", "America/Sao_Paulo"),
            ("-05:00", "America/New_York"),
            ("-06:00", "America/Chicago"),
            ("-07:00", "America/Denver"),
            ("-08:00", "America/Los_Angeles"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Self {
            profile: None,
            offsets,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
