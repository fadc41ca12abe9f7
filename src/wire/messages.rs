//! Typed wire messages emitted by the CLI in stream-json mode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::ContentBlock;
use super::usage::Usage;
use crate::{Error, Result};

/// A message from the Claude Code CLI NDJSON output.
///
/// Each output line is a JSON object whose `type` field selects one of four
/// kinds. Decoding goes through [`from_json_line`](WireMessage::from_json_line),
/// which peeks the type before committing to a variant schema; a derived
/// tagged deserializer would buffer the payload and lose the arbitrary
/// numeric precision stream events rely on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Session metadata, emitted first.
    System(SystemMessage),
    /// The model's response with content blocks.
    Assistant(AssistantMessage),
    /// An incremental streaming event.
    StreamEvent(StreamEventMessage),
    /// Final summary with aggregated usage and cost, emitted last.
    Result(ResultMessage),
}

/// Minimal envelope used to discriminate the message type before the full
/// decode.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl WireMessage {
    /// Decode one NDJSON record.
    ///
    /// Returns `Ok(None)` for records that should be skipped: lines that do
    /// not decode far enough to reveal a `type`, and lines whose `type` is
    /// unrecognized. A recognized type with a malformed payload is an
    /// error.
    pub fn from_json_line(line: &[u8]) -> Result<Option<Self>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }

        let Ok(envelope) = serde_json::from_slice::<Envelope>(line) else {
            return Ok(None);
        };

        let msg = match envelope.kind.as_str() {
            "system" => WireMessage::System(
                serde_json::from_slice(line).map_err(|e| Error::wire_parse("system", e))?,
            ),
            "assistant" => WireMessage::Assistant(
                serde_json::from_slice(line).map_err(|e| Error::wire_parse("assistant", e))?,
            ),
            "result" => WireMessage::Result(
                serde_json::from_slice(line).map_err(|e| Error::wire_parse("result", e))?,
            ),
            "stream_event" => WireMessage::StreamEvent(
                serde_json::from_slice(line).map_err(|e| Error::wire_parse("stream_event", e))?,
            ),
            _ => return Ok(None),
        };
        Ok(Some(msg))
    }

    /// Get as a system message.
    pub fn as_system(&self) -> Option<&SystemMessage> {
        match self {
            WireMessage::System(m) => Some(m),
            _ => None,
        }
    }

    /// Get as an assistant message.
    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            WireMessage::Assistant(m) => Some(m),
            _ => None,
        }
    }

    /// Get as a stream event message.
    pub fn as_stream_event(&self) -> Option<&StreamEventMessage> {
        match self {
            WireMessage::StreamEvent(m) => Some(m),
            _ => None,
        }
    }

    /// Get as a result message.
    pub fn as_result(&self) -> Option<&ResultMessage> {
        match self {
            WireMessage::Result(m) => Some(m),
            _ => None,
        }
    }
}

/// The first message emitted when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// System message subtype (e.g. "init").
    #[serde(default)]
    pub subtype: String,
    /// Unique identifier for this session.
    #[serde(default)]
    pub session_id: String,
    /// Model name in use (e.g. "sonnet").
    #[serde(default)]
    pub model: String,
    /// Working directory of the CLI process.
    #[serde(default)]
    pub cwd: String,
    /// Names of tools available in this session.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// The model's response, including content blocks and token usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// The nested response object.
    pub message: AssistantInner,
    /// Unique identifier for this session.
    #[serde(default)]
    pub session_id: String,
    /// Set when this response was generated inside a tool-use turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
    /// Backend error marker. The CLI does not document this field; it is
    /// read defensively and only the value "rate_limit" is acted upon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssistantMessage {
    /// Concatenate the text of all text content blocks.
    pub fn text(&self) -> String {
        self.message
            .content
            .iter()
            .filter_map(ContentBlock::text)
            .collect()
    }
}

/// The nested message object within an [`AssistantMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantInner {
    /// Message identifier assigned by the API.
    #[serde(default)]
    pub id: String,
    /// Role, typically "assistant".
    #[serde(default)]
    pub role: String,
    /// Model that generated this response.
    #[serde(default)]
    pub model: String,
    /// Ordered content blocks.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating, when known.
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// The stop sequence that triggered the stop, if any.
    #[serde(default)]
    pub stop_sequence: Option<String>,
    /// Token counts for this message.
    #[serde(default)]
    pub usage: Usage,
}

/// Wraps a single incremental streaming event.
///
/// The event payload is kept as a raw map: the CLI emits many event kinds
/// and only a handful matter here. Accessors for the common fields
/// (`event_type`, `delta_text`, `block_index`, `stop_reason`) are defined
/// alongside the event handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEventMessage {
    /// Raw event data; the embedded "type" field names the event kind.
    #[serde(default)]
    pub event: Map<String, Value>,
    /// Unique identifier for this session.
    #[serde(default)]
    pub session_id: String,
}

/// The final message emitted by the CLI.
///
/// After a result message, no further messages appear on the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// Result subtype (e.g. "success").
    #[serde(default)]
    pub subtype: String,
    /// True when the session ended with an error.
    #[serde(default)]
    pub is_error: bool,
    /// Final plain-text result; the error message when `is_error` is set.
    #[serde(default)]
    pub result: String,
    /// Wall-clock duration of the session in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Unique identifier for this session.
    #[serde(default)]
    pub session_id: String,
    /// Estimated total cost in US dollars.
    #[serde(default)]
    pub total_cost_usd: f64,
    /// Why the model stopped generating, when applicable.
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Aggregated token counts for the entire session.
    #[serde(default)]
    pub usage: Usage,
    /// Per-model usage breakdown, keyed by model name.
    #[serde(default, rename = "modelUsage")]
    pub model_usage: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_system_init() {
        let json = r#"{
            "type": "system",
            "subtype": "init",
            "cwd": "/home/user/project",
            "session_id": "550e8400-e29b-41d4-a716-446655440000",
            "tools": ["Bash", "Read", "Edit"],
            "model": "sonnet"
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let system = msg.as_system().unwrap();
        assert_eq!(system.subtype, "init");
        assert_eq!(system.cwd, "/home/user/project");
        assert_eq!(system.tools, vec!["Bash", "Read", "Edit"]);
        assert_eq!(system.model, "sonnet");
    }

    #[test]
    fn parse_assistant_message() {
        let json = r#"{
            "type": "assistant",
            "message": {
                "id": "msg_01234",
                "model": "claude-sonnet-4-5",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Hello, "},
                    {"type": "text", "text": "world!"}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 100, "output_tokens": 50}
            },
            "session_id": "sess-1"
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let assistant = msg.as_assistant().unwrap();
        assert_eq!(assistant.text(), "Hello, world!");
        assert_eq!(assistant.message.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(assistant.message.usage.input_tokens, 100);
        assert!(assistant.error.is_none());
        assert!(assistant.parent_tool_use_id.is_none());
    }

    #[test]
    fn parse_assistant_rate_limit_marker() {
        let json = r#"{
            "type": "assistant",
            "error": "rate_limit",
            "message": {
                "id": "msg_01234",
                "role": "assistant",
                "model": "sonnet",
                "content": [{"type": "text", "text": "You have hit the limit."}]
            },
            "session_id": "sess-1"
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let assistant = msg.as_assistant().unwrap();
        assert_eq!(assistant.error.as_deref(), Some("rate_limit"));
    }

    #[test]
    fn parse_result_success() {
        let json = r#"{
            "type": "result",
            "subtype": "success",
            "is_error": false,
            "duration_ms": 1234,
            "result": "The answer is 4.",
            "session_id": "sess-1",
            "total_cost_usd": 0.01,
            "usage": {"input_tokens": 100, "output_tokens": 50, "cache_read_input_tokens": 10},
            "modelUsage": {"claude-sonnet-4-5": {"input_tokens": 100}}
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let result = msg.as_result().unwrap();
        assert!(!result.is_error);
        assert_eq!(result.result, "The answer is 4.");
        assert_eq!(result.duration_ms, 1234);
        assert_eq!(result.usage.prompt_tokens(), 110);
        assert!(result.model_usage.contains_key("claude-sonnet-4-5"));
    }

    #[test]
    fn parse_result_error() {
        let json = r#"{
            "type": "result",
            "subtype": "error_during_execution",
            "is_error": true,
            "result": "Authentication failed"
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let result = msg.as_result().unwrap();
        assert!(result.is_error);
        assert_eq!(result.result, "Authentication failed");
    }

    #[test]
    fn parse_stream_event_keeps_raw_map() {
        let json = r#"{
            "type": "stream_event",
            "event": {
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": "Hello"}
            },
            "session_id": "sess-1"
        }"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let event = msg.as_stream_event().unwrap();
        assert_eq!(event.event["type"], "content_block_delta");
        assert_eq!(event.session_id, "sess-1");
    }

    #[test]
    fn missing_fields_default() {
        let json = r#"{"type": "result", "subtype": "success"}"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        let result = msg.as_result().unwrap();
        assert_eq!(result.result, "");
        assert_eq!(result.duration_ms, 0);
        assert_eq!(result.usage, Usage::default());
        assert!(result.model_usage.is_empty());
    }

    #[test]
    fn accessors_return_none_for_other_kinds() {
        let json = r#"{"type": "system", "subtype": "init"}"#;
        let msg = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        assert!(msg.as_assistant().is_none());
        assert!(msg.as_result().is_none());
        assert!(msg.as_stream_event().is_none());
        assert!(msg.as_system().is_some());
    }

    #[test]
    fn roundtrip_wire_message() {
        let original = WireMessage::System(SystemMessage {
            subtype: "init".into(),
            session_id: "sess-123".into(),
            model: "sonnet".into(),
            cwd: "/home".into(),
            tools: vec!["Read".into()],
        });
        let json = serde_json::to_string(&original).unwrap();
        let parsed = WireMessage::from_json_line(json.as_bytes()).unwrap().unwrap();
        assert_eq!(original, parsed);
    }
}
