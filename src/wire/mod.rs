//! Wire format types and streaming NDJSON parser for Claude Code CLI output.
//!
//! When the CLI is invoked with `--output-format=stream-json`, it writes
//! newline-delimited JSON to stdout. Each line is an object with a `type`
//! field that discriminates between four message kinds:
//!
//! - `system` ([`SystemMessage`]): session metadata, emitted first;
//! - `assistant` ([`AssistantMessage`]): the model's response with content
//!   blocks;
//! - `stream_event` ([`StreamEventMessage`]): incremental streaming events
//!   such as `content_block_delta` and `message_delta`;
//! - `result` ([`ResultMessage`]): final summary with aggregated usage and
//!   cost, emitted last.
//!
//! Use [`Parser`] to read typed messages from a byte stream:
//!
//! ```ignore
//! let mut parser = Parser::new(stdout);
//! while let Some(msg) = parser.next().await? {
//!     match msg {
//!         WireMessage::StreamEvent(ev) => print!("{}", ev.delta_text()),
//!         WireMessage::Result(res) => println!("tokens: {}", res.usage.total_tokens()),
//!         _ => {}
//!     }
//! }
//! ```

mod content;
mod events;
mod messages;
mod parser;
mod usage;

pub use content::ContentBlock;
pub use messages::{
    AssistantInner, AssistantMessage, ResultMessage, StreamEventMessage, SystemMessage,
    WireMessage,
};
pub use parser::{Parser, MAX_RECORD_BYTES};
pub use usage::Usage;
