//! # cc-proxy
//!
//! An OpenAI-compatible chat completions adapter over the Claude Code CLI.
//!
//! Each incoming request spawns an isolated `claude` subprocess, feeds it a
//! synthesized prompt over stdin, parses the NDJSON event stream from its
//! stdout, and translates that stream back into OpenAI-shaped responses —
//! a single JSON object or an SSE stream of chunks. Tool calling is
//! prompt-engineered: tool schemas are rendered as system-prompt
//! instructions and the model's `<tool_call>` tags are parsed back into
//! structured calls.
//!
//! ## Layers
//!
//! - [`wire`] — typed NDJSON messages and the tolerant streaming parser;
//! - [`chat`] — per-request subprocess lifecycle: spawn, bounded
//!   concurrency, timeout, idempotent teardown;
//! - [`oai`] — OpenAI request/response/chunk types and an embedded client;
//! - [`bridge`] — request flattening, response assembly, tool-call
//!   extraction, and the streaming hold-back state machine;
//! - [`server`] — the axum HTTP surface.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use cc_proxy::chat::{Client, ClientConfig};
//! use cc_proxy::oai::{ChatCompletionRequest, ChatMessage, OaiClient};
//!
//! #[tokio::main]
//! async fn main() -> cc_proxy::Result<()> {
//!     let client = Arc::new(Client::new(ClientConfig::default()));
//!     let oai = OaiClient::new(client);
//!     let response = oai
//!         .chat_completion(ChatCompletionRequest {
//!             model: "haiku".into(),
//!             messages: vec![ChatMessage::text_message("user", "What is 2+2?")],
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{}", response.choices[0].message.text());
//!     Ok(())
//! }
//! ```

mod error;

pub mod bridge;
pub mod chat;
pub mod oai;
pub mod server;
pub mod wire;

pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_send<T: Send>() {}

    /// The long-lived and shared types must cross task boundaries.
    #[test]
    fn public_types_are_send_sync() {
        assert_send_sync::<chat::Client>();
        assert_send_sync::<chat::ClientConfig>();
        assert_send_sync::<oai::OaiClient>();
        assert_send_sync::<server::ServerConfig>();
        assert_send_sync::<wire::WireMessage>();
        assert_send_sync::<Error>();
    }

    /// Streams are single-owner: Send but carrying mutable state.
    #[test]
    fn streams_are_send() {
        assert_send::<chat::Stream>();
        assert_send::<oai::ChatCompletionStream>();
        assert_send::<bridge::StreamState>();
    }
}
