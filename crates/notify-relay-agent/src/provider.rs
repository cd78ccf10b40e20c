use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use notify_relay_core::config::CompletionConfig;
use notify_relay_core::error::RelayError;

/// A single message in the request's `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat-completions request.
///
/// Everything except the message content comes from [`CompletionConfig`].
/// `stop` is always sent, as an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stream: bool,
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    /// Build a request carrying `message` verbatim as its only message.
    pub fn new(config: &CompletionConfig, message: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: config.role.clone(),
                content: message.into(),
            }],
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            stream: false,
            stop: None,
        }
    }

    /// Content of the (single) message.
    pub fn message(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Successful exchange with the endpoint: a 2xx status and a non-empty body.
///
/// The body is the raw response text; no schema is imposed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub status: u16,
    pub body: String,
}

/// Seam between the completion client and the transport.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Perform one request. Exactly one attempt; no retries.
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("empty response body (HTTP {status})")]
    EmptyBody { status: u16 },

    /// `stage` is `"connect"` or `"request"`, matching the timeout that fired.
    #[error("{stage} timed out after {ms}ms")]
    Timeout { stage: &'static str, ms: u64 },
}

impl From<ProviderError> for RelayError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Http(e) => RelayError::TransportFailure(e.to_string()),
            e @ ProviderError::Timeout { .. } => RelayError::TransportFailure(e.to_string()),
            ProviderError::Api { status, message } => RelayError::EndpointError {
                status,
                body: message,
            },
            ProviderError::EmptyBody { status } => RelayError::EndpointError {
                status,
                body: "empty response body".to_string(),
            },
        }
    }
}
