//! OpenAI-compatible chat completion response types.

use serde::{Deserialize, Serialize};

use super::request::ChatMessage;

/// An OpenAI-compatible chat completion response.
///
/// The id is derived from the backend session id as `chatcmpl-<session-id>`;
/// the model field reflects the model actually used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    /// Always "chat.completion".
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_fingerprint: String,
}

/// A single completion alternative.
///
/// `finish_reason` is "stop" for normal completion, "tool_calls" when the
/// model invoked tools, or "length" if output was truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Token usage statistics for a completion.
///
/// `prompt_tokens` includes every input category (direct, cache-read, and
/// cache-creation); `total_tokens` is prompt plus completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// An OpenAI-compatible error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error information within an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    /// Error category, e.g. "invalid_request" or "internal_error".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A model entry for the `/v1/models` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    /// Always "model".
    pub object: String,
    pub owned_by: String,
}

/// The `/v1/models` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Always "list".
    pub object: String,
    pub data: Vec<ModelInfo>,
}
