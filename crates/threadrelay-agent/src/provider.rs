use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supported completion model identifiers. Serializes to the exact wire
/// string the remote service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-0314")]
    Gpt4_0314,
    #[serde(rename = "gpt-4-32k")]
    Gpt4_32k,
    #[serde(rename = "gpt-4-32k-0314")]
    Gpt4_32k0314,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-3.5-turbo-0301")]
    Gpt35Turbo0301,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt4 => "gpt-4",
            Model::Gpt4_0314 => "gpt-4-0314",
            Model::Gpt4_32k => "gpt-4-32k",
            Model::Gpt4_32k0314 => "gpt-4-32k-0314",
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::Gpt35Turbo0301 => "gpt-3.5-turbo-0301",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported model identifier: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for Model {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4" => Ok(Model::Gpt4),
            "gpt-4-0314" => Ok(Model::Gpt4_0314),
            "gpt-4-32k" => Ok(Model::Gpt4_32k),
            "gpt-4-32k-0314" => Ok(Model::Gpt4_32k0314),
            "gpt-3.5-turbo" => Ok(Model::Gpt35Turbo),
            "gpt-3.5-turbo-0301" => Ok(Model::Gpt35Turbo0301),
            other => Err(UnknownModel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Optional sampling/control parameters of a completion request.
///
/// Every `None` is omitted from the serialized body so the remote default
/// applies. Ranges are not validated locally — an out-of-range value is
/// forwarded and surfaces as [`CompletionError::InvalidRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Sampling temperature, 0.0–2.0. Remote default: 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus-sampling probability mass, 0.0–1.0. Remote default: 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Number of candidate choices to generate. Remote default: 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Streaming flag. Forwarded verbatim when set; this client never
    /// consumes a streamed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Up to four sequences at which generation stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Maximum tokens to generate. Remote default: model context limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Presence penalty, -2.0–2.0. Remote default: 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty, -2.0–2.0. Remote default: 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Per-token logit bias keyed by token ID, -100–100 each.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    /// End-user identifier forwarded for abuse monitoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// One chat-completion request. Constructed fresh per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: Model,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub options: SamplingOptions,
}

/// One generated candidate inside a [`CompletionResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Structured completion response. Read-only once received.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    #[serde(default)]
    pub object: String,
    pub created: i64,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Narrow interface to a chat-completion service.
///
/// Implementations must be `Send + Sync` — one shared handle serves
/// concurrent invocations without locking.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Service name for logging and error messages.
    fn name(&self) -> &str;

    /// Send one completion request and wait for the full response.
    ///
    /// Returns a response whose `choices` sequence is non-empty, or one of
    /// the [`CompletionError`] kinds — a zero-choice response is never
    /// silently treated as success. Performs no retries; retry policy, if
    /// any, belongs to the caller.
    async fn complete(&self, req: &CompletionRequest)
        -> Result<CompletionResponse, CompletionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Network-level failure: timeout, connection reset, DNS, or an
    /// undecodable response body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service rejected the credential.
    #[error("authentication rejected ({status}): {body}")]
    Authentication { status: u16, body: String },

    /// The remote service reported a malformed request (unsupported model,
    /// parameter out of range).
    #[error("invalid request ({status}): {body}")]
    InvalidRequest { status: u16, body: String },

    /// Throttled by the remote service.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64, body: String },

    /// Any other non-success response.
    #[error("upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// A success response that carried no choices.
    #[error("completion response contained no choices")]
    NoChoices,
}
