//! Typed accessors over raw streaming events.
//!
//! Stream events arrive as opaque key-value maps because the CLI emits many
//! event kinds (`message_start`, `content_block_start`, `content_block_delta`,
//! `content_block_stop`, `message_delta`, `message_stop`, ...) and new kinds
//! appear over time. Rather than a closed enum, the few fields the proxy
//! cares about are extracted on demand.

use serde_json::Value;

use super::messages::StreamEventMessage;

impl StreamEventMessage {
    /// The event kind from the embedded `type` field, or "" if absent.
    pub fn event_type(&self) -> &str {
        self.event
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The text carried by a `content_block_delta` event.
    ///
    /// Returns "" unless the nested delta is a `text_delta`.
    pub fn delta_text(&self) -> &str {
        let Some(delta) = self.event.get("delta").and_then(Value::as_object) else {
            return "";
        };
        if delta.get("type").and_then(Value::as_str) != Some("text_delta") {
            return "";
        }
        delta
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The content block index from the top-level `index` field, or -1 if
    /// missing or not an integer.
    pub fn block_index(&self) -> i64 {
        self.event
            .get("index")
            .and_then(Value::as_i64)
            .unwrap_or(-1)
    }

    /// The `delta.stop_reason` from a `message_delta` event, or "".
    pub fn stop_reason(&self) -> &str {
        self.event
            .get("delta")
            .and_then(Value::as_object)
            .and_then(|delta| delta.get("stop_reason"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The model name from a `message_start` event's nested message.
    pub fn message_model(&self) -> Option<&str> {
        self.event
            .get("message")
            .and_then(Value::as_object)
            .and_then(|message| message.get("model"))
            .and_then(Value::as_str)
    }
}
