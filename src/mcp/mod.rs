//! Remote tool-execution service boundary.
//!
//! The engine talks to a Model Context Protocol server that exposes Google
//! Workspace operations as named tools. [`ToolService`] is the seam: the
//! production implementation is [`client::McpHttpClient`], tests use fakes.
//!
//! Results arrive either as free text or as structured JSON; [`ToolResult`]
//! keeps that distinction so the formatter matches on the tag instead of
//! guessing the shape.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Argument map sent with a tool invocation.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

// ── Result and error types ──

/// Raw result of a remote tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// Free-text result (the common case for Workspace tools).
    Text(String),
    /// Structured result with no text rendering.
    Structured(serde_json::Value),
}

impl ToolResult {
    /// Coerce the result to text for pattern-based formatting.
    ///
    /// JSON strings unwrap to their contents; other structured values are
    /// pretty-printed.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(serde_json::Value::String(s)) => s.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Errors from the tool-execution service.
#[derive(Debug, Error)]
pub enum ToolServiceError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid tool service URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// HTTP transport failure.
    #[error("tool service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("tool service returned {status} {reason}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase (e.g. "Unauthorized").
        reason: String,
        /// Sanitized response body.
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("tool service JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned a JSON-RPC error response.
    #[error("tool service error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the server.
        message: String,
    },

    /// Protocol-level error (unexpected response format, missing fields).
    #[error("tool service protocol error: {0}")]
    Protocol(String),

    /// The tool ran and reported failure (`isError: true`).
    #[error("{0}")]
    ToolFailed(String),
}

/// A tool advertised by the service via `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name as reported by the server.
    pub name: String,
    /// Optional description of what the tool does.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    #[serde(default = "default_empty_object", rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn default_empty_object() -> serde_json::Value {
    serde_json::json!({})
}

// ── Trait ──

/// The remote tool-execution service.
///
/// Implementations inject the caller identity the way the server expects and
/// must be usable from concurrent turns.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Invoke `tool_name` with `arguments` on behalf of `caller_identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolServiceError`] on transport, protocol or tool failure.
    async fn call(
        &self,
        tool_name: &str,
        arguments: ToolArguments,
        caller_identity: &str,
    ) -> Result<ToolResult, ToolServiceError>;

    /// List the tools the service exposes.
    ///
    /// # Errors
    ///
    /// Returns [`ToolServiceError`] on transport or protocol failure.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError>;
}
