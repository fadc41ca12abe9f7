//! Translation between OpenAI chat completions and the CLI wire format.
//!
//! Three directions of traffic meet here:
//!
//! - [`request_to_query`] flattens an OpenAI request into a role-prefixed
//!   prompt plus query options, rendering tool schemas as system-prompt
//!   instructions;
//! - [`result_to_response`] assembles a non-streaming OpenAI response from
//!   the final wire messages, extracting `<tool_call>` tags back into
//!   structured calls;
//! - [`StreamState`] converts wire stream events into OpenAI chunks with a
//!   hold-back buffer that keeps partial tags from ever reaching clients.

mod request;
mod response;
mod stream;
mod tools;

pub use request::request_to_query;
pub use response::result_to_response;
pub use stream::{StreamState, HOLD_BACK};
pub use tools::{has_tool_call_prefix, parse_tool_calls, tool_call_instructions, TOOL_CALL_OPEN};
