//! MCP JSON-RPC 2.0 client over streamable HTTP.
//!
//! Implements the Model Context Protocol handshake (`initialize` followed by
//! `notifications/initialized`), tool discovery (`tools/list`) and tool
//! invocation (`tools/call`) as HTTP `POST`s to a single endpoint.
//!
//! The server may answer with `application/json` or with a
//! `text/event-stream` body whose `data:` lines carry the JSON-RPC response.
//! Both are decoded by [`decode_rpc_body`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{ToolArguments, ToolDescriptor, ToolResult, ToolService, ToolServiceError};
use crate::providers::sanitize_http_error_body;

/// Protocol revision announced in `initialize`.
const PROTOCOL_VERSION: &str = "2025-03-26";

/// Header carrying the server-assigned session id.
const SESSION_HEADER: &str = "mcp-session-id";

/// Argument name the Workspace server reads the acting account from.
pub const CALLER_ARGUMENT: &str = "user_google_email";

// ── JSON-RPC wire types ──

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Result payload of `tools/call`.
#[doc(hidden)]
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolResult {
    /// Content blocks returned by the tool.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Optional structured result.
    #[serde(default, rename = "structuredContent")]
    pub structured_content: Option<serde_json::Value>,
    /// Whether the tool invocation was an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// A single content block in a tool result.
#[doc(hidden)]
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    /// Content type ("text", "image", "resource").
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content (for type="text").
    #[serde(default)]
    pub text: Option<String>,
}

impl CallToolResult {
    fn joined_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// Convert into the engine's tagged result, or the tool's own failure.
    ///
    /// Text blocks win over `structuredContent`; the Workspace tools render
    /// their useful output as text.
    ///
    /// # Errors
    ///
    /// Returns `ToolServiceError::ToolFailed` when `isError` is set.
    #[doc(hidden)]
    pub fn into_tool_result(self) -> Result<ToolResult, ToolServiceError> {
        let text = self.joined_text();
        if self.is_error {
            return Err(ToolServiceError::ToolFailed(
                text.unwrap_or_else(|| "tool reported an error without details".to_owned()),
            ));
        }
        match (text, self.structured_content) {
            (Some(text), _) => Ok(ToolResult::Text(text)),
            (None, Some(value)) => Ok(ToolResult::Structured(value)),
            (None, None) => Ok(ToolResult::Text(String::new())),
        }
    }
}

// ── Body decoding ──

/// Decode a JSON-RPC response body into its `result` value.
///
/// `content_type` selects between a plain JSON body and an SSE stream. For
/// SSE, the first event whose payload carries a non-null `id` is the
/// response; notifications are skipped.
///
/// # Errors
///
/// Returns `Server` for a JSON-RPC error object, `Protocol` when no response
/// is found, `Json` for malformed payloads.
#[doc(hidden)]
pub fn decode_rpc_body(body: &str, content_type: &str) -> Result<serde_json::Value, ToolServiceError> {
    let response = if content_type.contains("text/event-stream") {
        sse_response(body)?
    } else {
        serde_json::from_str::<JsonRpcResponse>(body.trim())?
    };

    if let Some(err) = response.error {
        return Err(ToolServiceError::Server {
            code: err.code,
            message: err.message,
        });
    }

    response
        .result
        .ok_or_else(|| ToolServiceError::Protocol("response has neither result nor error".into()))
}

fn sse_response(body: &str) -> Result<JsonRpcResponse, ToolServiceError> {
    let mut data = String::new();
    let mut events: Vec<String> = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if !data.is_empty() {
                events.push(std::mem::take(&mut data));
            }
            continue;
        }
        if let Some(payload) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(payload.trim_start());
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    for event in events {
        let response: JsonRpcResponse = serde_json::from_str(&event)?;
        if response.id.as_ref().is_some_and(|v| !v.is_null()) {
            return Ok(response);
        }
    }

    Err(ToolServiceError::Protocol(
        "event stream ended without a response".into(),
    ))
}

// ── Client ──

/// Session state negotiated by the `initialize` handshake.
#[derive(Debug, Clone, Default)]
struct Session {
    id: Option<String>,
}

/// MCP client for a streamable-HTTP server.
///
/// The handshake runs lazily on first use. The session id is the only state
/// held; it carries no per-user data, so one client serves every caller.
pub struct McpHttpClient {
    endpoint: Url,
    http: reqwest::Client,
    session: Mutex<Option<Session>>,
    next_id: AtomicU64,
}

impl McpHttpClient {
    /// Create a client for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `ToolServiceError::InvalidUrl` if `url` does not parse or is
    /// not http(s).
    pub fn new(url: &str) -> Result<Self, ToolServiceError> {
        let endpoint = Url::parse(url).map_err(|e| ToolServiceError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ToolServiceError::InvalidUrl {
                url: url.to_owned(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }
        Ok(Self {
            endpoint,
            http: reqwest::Client::new(),
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint this client posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run the handshake if it has not happened yet; return the session id.
    async fn ensure_session(&self) -> Result<Option<String>, ToolServiceError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.id.clone());
        }

        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "rituo",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let (session_id, result) = self.request("initialize", Some(params), None).await?;
        debug!(
            server = %result.get("serverInfo").map(|v| v.to_string()).unwrap_or_default(),
            "MCP initialize complete"
        );

        self.notify("notifications/initialized", session_id.as_deref())
            .await?;

        info!(endpoint = %self.endpoint, session = session_id.is_some(), "connected to MCP server");
        *guard = Some(Session {
            id: session_id.clone(),
        });
        Ok(session_id)
    }

    /// Forget the session so the next call performs a fresh handshake.
    async fn reset_session(&self) {
        *self.session.lock().await = None;
    }

    fn post(&self, session_id: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream");
        match session_id {
            Some(id) => builder.header(SESSION_HEADER, id),
            None => builder,
        }
    }

    /// Send a JSON-RPC request; return the response session header and result.
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        session_id: Option<&str>,
    ) -> Result<(Option<String>, serde_json::Value), ToolServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: Some(id),
            method,
            params,
        };

        let response = self.post(session_id).json(&request).send().await?;
        let status = response.status();
        let returned_session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| session_id.map(str::to_owned));
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_owned();
        let body = response.text().await?;

        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND && session_id.is_some() {
                warn!(method, "MCP session no longer recognised, will re-initialize");
                self.reset_session().await;
            }
            return Err(ToolServiceError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_owned(),
                body: sanitize_http_error_body(&body),
            });
        }

        let result = decode_rpc_body(&body, &content_type)?;
        Ok((returned_session, result))
    }

    /// Send a JSON-RPC notification (no id, no response expected).
    async fn notify(&self, method: &str, session_id: Option<&str>) -> Result<(), ToolServiceError> {
        let notification = JsonRpcRequest {
            jsonrpc: "2.0",
            id: None,
            method,
            params: None,
        };
        let response = self.post(session_id).json(&notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolServiceError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_owned(),
                body: sanitize_http_error_body(&body),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ToolService for McpHttpClient {
    #[instrument(skip(self, arguments, caller_identity), fields(tool = tool_name))]
    async fn call(
        &self,
        tool_name: &str,
        mut arguments: ToolArguments,
        caller_identity: &str,
    ) -> Result<ToolResult, ToolServiceError> {
        let session_id = self.ensure_session().await?;

        arguments.insert(
            CALLER_ARGUMENT.to_owned(),
            serde_json::Value::String(caller_identity.to_owned()),
        );
        debug!(args = ?arguments.keys().collect::<Vec<_>>(), "calling MCP tool");

        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });
        let (_, result) = self
            .request("tools/call", Some(params), session_id.as_deref())
            .await?;

        let call_result: CallToolResult = serde_json::from_value(result)?;
        call_result.into_tool_result()
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        let session_id = self.ensure_session().await?;
        let (_, result) = self
            .request("tools/list", None, session_id.as_deref())
            .await?;

        let tools_value = result
            .get("tools")
            .ok_or_else(|| ToolServiceError::Protocol("tools/list: missing 'tools' field".into()))?;
        let tools: Vec<ToolDescriptor> = serde_json::from_value(tools_value.clone())?;
        Ok(tools)
    }
}
