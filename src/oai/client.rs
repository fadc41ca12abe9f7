//! Embedded OpenAI-compatible client, no HTTP server required.

use std::collections::VecDeque;
use std::sync::Arc;

use super::chunk::ChatCompletionChunk;
use super::request::ChatCompletionRequest;
use super::response::{ChatCompletionResponse, ModelInfo};
use crate::bridge::{request_to_query, result_to_response, StreamState};
use crate::chat::{self, Effort};
use crate::wire::{AssistantMessage, ResultMessage, WireMessage};
use crate::{Error, Result};

/// An OpenAI-style chat completions interface backed directly by a
/// [`chat::Client`] — the same bridge logic as the HTTP server, callable
/// in-process.
#[derive(Debug, Clone)]
pub struct OaiClient {
    chat: Arc<chat::Client>,
    effort: Option<Effort>,
}

impl OaiClient {
    /// Wrap an existing subprocess client.
    pub fn new(chat: Arc<chat::Client>) -> Self {
        Self { chat, effort: None }
    }

    /// Set the reasoning effort applied to every request.
    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = Some(effort);
        self
    }

    /// The static list of available models.
    pub fn list_models() -> Vec<ModelInfo> {
        ["sonnet", "opus", "haiku"]
            .into_iter()
            .map(|id| ModelInfo {
                id: id.to_string(),
                object: "model".to_string(),
                owned_by: "anthropic".to_string(),
            })
            .collect()
    }

    /// Send a non-streaming chat completion request.
    ///
    /// The request's stream flag is forced off. Backend-reported errors
    /// surface as [`Error::Backend`]; a stream that ends without a result
    /// is [`Error::UnexpectedEof`].
    pub async fn chat_completion(
        &self,
        mut req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        req.stream = false;
        let has_tools = !req.tools.is_empty();
        let (prompt, mut opts) = request_to_query(&req);
        opts.effort = self.effort;

        let mut stream = self.chat.query(&prompt, opts).await?;
        let outcome = collect_response(&mut stream, has_tools).await;
        stream.close().await;
        outcome
    }

    /// Send a streaming chat completion request.
    ///
    /// The request's stream flag is forced on. The caller must call
    /// [`ChatCompletionStream::close`] when finished reading.
    pub async fn chat_completion_stream(
        &self,
        mut req: ChatCompletionRequest,
    ) -> Result<ChatCompletionStream> {
        req.stream = true;
        let has_tools = !req.tools.is_empty();
        let (prompt, mut opts) = request_to_query(&req);
        opts.effort = self.effort;

        let stream = self.chat.query(&prompt, opts).await?;
        Ok(ChatCompletionStream {
            raw: stream,
            state: StreamState::new(has_tools),
            pending: VecDeque::new(),
            done: false,
        })
    }
}

async fn collect_response(
    stream: &mut chat::Stream,
    has_tools: bool,
) -> Result<ChatCompletionResponse> {
    let mut last_assistant: Option<AssistantMessage> = None;
    let mut result: Option<ResultMessage> = None;

    loop {
        match stream.next().await? {
            Some(WireMessage::Assistant(assistant)) => last_assistant = Some(assistant),
            Some(WireMessage::Result(res)) => result = Some(res),
            Some(_) => {}
            None => break,
        }
    }

    let result = result.ok_or(Error::UnexpectedEof)?;
    if result.is_error {
        return Err(Error::Backend {
            message: result.result,
        });
    }

    Ok(result_to_response(&result, last_assistant.as_ref(), has_tools))
}

/// Pull-style iterator over streaming chat completion chunks.
///
/// A single wire event can produce several chunks (remaining text plus tool
/// calls at finish); surplus chunks queue internally and drain across
/// subsequent [`recv`](ChatCompletionStream::recv) calls.
pub struct ChatCompletionStream {
    raw: chat::Stream,
    state: StreamState,
    pending: VecDeque<ChatCompletionChunk>,
    done: bool,
}

impl ChatCompletionStream {
    /// Receive the next chunk, or `Ok(None)` once the stream is complete.
    ///
    /// After an error or the end of the stream, further calls return
    /// `Ok(None)`.
    pub async fn recv(&mut self) -> Result<Option<ChatCompletionChunk>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        if self.done {
            return Ok(None);
        }

        loop {
            let msg = match self.raw.next().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };

            let chunks = match msg {
                WireMessage::StreamEvent(ev) => self.state.handle_event(&ev),
                WireMessage::Result(_) => self.state.finish(),
                _ => Vec::new(),
            };

            let mut chunks = chunks.into_iter();
            if let Some(first) = chunks.next() {
                self.pending.extend(chunks);
                return Ok(Some(first));
            }
        }
    }

    /// Terminate the stream, killing the underlying subprocess and
    /// releasing its concurrency slot.
    pub async fn close(&mut self) {
        self.done = true;
        self.pending.clear();
        self.raw.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_list_is_static() {
        let models = OaiClient::list_models();
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["sonnet", "opus", "haiku"]);
        for model in &models {
            assert_eq!(model.object, "model");
            assert_eq!(model.owned_by, "anthropic");
        }
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OaiClient>();
    }

    #[test]
    fn stream_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ChatCompletionStream>();
    }
}
