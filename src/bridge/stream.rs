//! Streaming state machine: wire events to OpenAI chunks.

use std::time::{SystemTime, UNIX_EPOCH};

use super::response::unix_now;
use super::tools::{has_tool_call_prefix, parse_tool_calls, TOOL_CALL_OPEN};
use crate::oai::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
use crate::wire::StreamEventMessage;

/// Bytes held back from the end of the buffer while streaming with tools
/// enabled, so a partially received opening tag is never forwarded.
pub const HOLD_BACK: usize = TOOL_CALL_OPEN.len();

/// Per-stream translation state.
///
/// In tools mode every text delta is appended to an internal buffer that
/// mirrors the full model output; text is only forwarded up to a safety
/// margin of [`HOLD_BACK`] bytes from the buffer end. Once the opening-tag
/// prefix is seen anywhere in the buffer, forwarding stops entirely and the
/// authoritative tag parse happens once at finish. Emitted content is never
/// retracted.
pub struct StreamState {
    id: String,
    model: String,
    created: i64,
    has_tools: bool,
    buffering: bool,
    buffer: String,
    emitted: usize,
}

impl StreamState {
    /// Create state for one streaming response.
    pub fn new(has_tools: bool) -> Self {
        Self {
            id: format!("chatcmpl-{}", unix_nanos()),
            model: String::new(),
            created: unix_now(),
            has_tools,
            buffering: false,
            buffer: String::new(),
            emitted: 0,
        }
    }

    /// Process one wire stream event, returning the chunks to emit.
    ///
    /// `message_start` learns the model name and yields the role-only init
    /// chunk; `content_block_delta` yields at most one content chunk; every
    /// other event kind yields nothing.
    pub fn handle_event(&mut self, ev: &StreamEventMessage) -> Vec<ChatCompletionChunk> {
        match ev.event_type() {
            "message_start" => {
                if let Some(model) = ev.message_model() {
                    self.model = model.to_string();
                }
                vec![self.init_chunk()]
            }
            "content_block_delta" => {
                let text = ev.delta_text();
                if text.is_empty() {
                    return Vec::new();
                }
                self.text_delta(text).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Process an incremental text fragment.
    ///
    /// Returns `None` when nothing can be emitted yet.
    pub fn text_delta(&mut self, text: &str) -> Option<ChatCompletionChunk> {
        if !self.has_tools {
            return Some(self.content_chunk(text.to_string()));
        }

        self.buffer.push_str(text);

        if self.buffering {
            return None;
        }

        if has_tool_call_prefix(&self.buffer) {
            self.buffering = true;
            return None;
        }

        // Emit text up to the safety margin from the end of the buffer,
        // floored to a char boundary so multi-byte text never splits.
        let safe_end = floor_char_boundary(
            &self.buffer,
            self.buffer.len().saturating_sub(HOLD_BACK),
        );
        if safe_end <= self.emitted {
            return None;
        }

        let content = self.buffer[self.emitted..safe_end].to_string();
        self.emitted = safe_end;
        Some(self.content_chunk(content))
    }

    /// Produce the final chunk(s) once the result message arrives.
    ///
    /// With tools enabled and buffered output, the full buffer is reparsed:
    /// found calls flush any un-streamed cleaned text and terminate with
    /// finish reason "tool_calls"; otherwise the buffered tail is flushed
    /// and the stream terminates with "stop". Exactly one terminal chunk is
    /// emitted either way.
    pub fn finish(&mut self) -> Vec<ChatCompletionChunk> {
        let mut chunks = Vec::new();

        if self.has_tools && !self.buffer.is_empty() {
            let (clean_text, tool_calls) = parse_tool_calls(&self.buffer);

            if !tool_calls.is_empty() {
                let start = floor_char_boundary(&clean_text, self.emitted);
                if clean_text.len() > start {
                    chunks.push(self.content_chunk(clean_text[start..].to_string()));
                }
                chunks.push(self.terminal_chunk(
                    ChunkDelta {
                        tool_calls,
                        ..Default::default()
                    },
                    "tool_calls",
                ));
                return chunks;
            }

            if self.buffer.len() > self.emitted {
                let tail = self.buffer[self.emitted..].to_string();
                chunks.push(self.content_chunk(tail));
            }
        }

        chunks.push(self.terminal_chunk(ChunkDelta::default(), "stop"));
        chunks
    }

    /// The role-only chunk that opens every stream.
    fn init_chunk(&self) -> ChatCompletionChunk {
        self.chunk(
            ChunkDelta {
                role: Some("assistant".to_string()),
                ..Default::default()
            },
            None,
        )
    }

    fn content_chunk(&self, content: String) -> ChatCompletionChunk {
        self.chunk(
            ChunkDelta {
                content: Some(content),
                ..Default::default()
            },
            None,
        )
    }

    fn terminal_chunk(&self, delta: ChunkDelta, reason: &str) -> ChatCompletionChunk {
        self.chunk(delta, Some(reason.to_string()))
    }

    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<String>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            usage: None,
        }
    }

    #[cfg(test)]
    fn set_buffer_for_test(&mut self, content: &str) {
        self.buffer.clear();
        self.buffer.push_str(content);
    }
}

/// Largest index `<= index` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
