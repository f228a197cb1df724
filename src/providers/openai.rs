//! OpenAI-compatible provider using the `/chat/completions` API.
//!
//! Groq, OpenAI and LM Studio all accept this wire format; only the base URL
//! and model name differ.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, strip_reasoning, ApiCredential, CompletionRequest, CompletionResponse,
    LlmProvider, ProviderError,
};

const DEFAULT_MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Chat completions request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Maximum completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A message in chat completions format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// Chat completions response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Response choices.
    pub choices: Vec<ChatChoice>,
    /// Model that served the response.
    #[serde(default)]
    pub model: String,
}

/// A response choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Assistant message for this choice.
    pub message: ChatResponseMessage,
}

/// Assistant message in a choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// Optional text content.
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Provider for any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    endpoint: String,
    model_name: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider for `{base_url}/chat/completions`.
    pub fn new(base_url: &str, model_name: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model_name: model_name.into(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Full completions URL this provider posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a chat completions request from a completion request.
#[doc(hidden)]
pub fn build_request(model: &str, request: &CompletionRequest, max_tokens: u32) -> ChatRequest {
    let messages = request
        .messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        })
        .collect();

    ChatRequest {
        model: model.to_owned(),
        messages,
        max_tokens: Some(request.max_tokens.unwrap_or(max_tokens)),
    }
}

/// Parse a chat completions response body.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or has
/// no choices.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<CompletionResponse, ProviderError> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("missing choices[0]".to_owned()))?;

    let text = choice
        .message
        .content
        .map(|t| strip_reasoning(&t))
        .unwrap_or_default();

    Ok(CompletionResponse {
        text,
        model: resp.model,
    })
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &ApiCredential,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_request = build_request(
            &self.model_name,
            &request,
            if self.max_tokens == 0 {
                DEFAULT_MAX_TOKENS
            } else {
                self.max_tokens
            },
        );

        tracing::debug!(
            model = %self.model_name,
            messages = api_request.messages.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .bearer_auth(credential.expose())
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model_name
    }
}
