//! OpenAI-compatible streaming chunk types.

use serde::{Deserialize, Serialize};

use super::request::ToolCall;
use super::response::Usage;

/// A single chunk in a streaming chat completion response.
///
/// All chunks of one stream share the same id and created timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    /// Always "chat.completion.chunk".
    pub object: String,
    pub created: i64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A single choice within a streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    /// Null on every chunk except the terminal one. Serialized even when
    /// null so clients can key on its presence.
    pub finish_reason: Option<String>,
}

/// Incremental content within a streaming chunk.
///
/// `content` distinguishes absent (field omitted) from the empty string:
/// role-only and terminal chunks omit it entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}
