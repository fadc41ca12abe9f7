//! Prompt-engineered tool calling: instruction rendering and tag extraction.
//!
//! The backend CLI has no native tool interface in this configuration, so
//! tool schemas are rendered into the system prompt and the model is asked
//! to answer with `<tool_call>{json}</tool_call>` tags, which are parsed
//! back out of its plain-text output.

use std::sync::LazyLock;

use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::oai::{FunctionCall, Tool, ToolCall};

/// The literal opening tag. Its length is the streaming hold-back margin.
pub const TOOL_CALL_OPEN: &str = "<tool_call>";

/// Opening-tag prefix without the closing bracket, so truncated attempts
/// are detected too.
const TOOL_CALL_SENTINEL: &str = "<tool_call";

static TOOL_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tool_call>(.*?)</tool_call>").unwrap());

/// Render Markdown system-prompt instructions teaching the model to invoke
/// the given tools via `<tool_call>` tags.
///
/// Each tool of type "function" is listed with its name, description, and
/// JSON-serialized parameter schema. Returns the empty string when `tools`
/// is empty.
pub fn tool_call_instructions(tools: &[Tool]) -> String {
    if tools.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("\n\n## Available Tools\n\n");
    out.push_str("You have access to the following tools. To call a tool, output a <tool_call> tag:\n\n");
    out.push_str("<tool_call>{\"name\": \"tool_name\", \"arguments\": {\"param\": \"value\"}}</tool_call>\n\n");

    for tool in tools {
        if tool.kind != "function" {
            continue;
        }
        out.push_str("### ");
        out.push_str(&tool.function.name);
        out.push('\n');
        if !tool.function.description.is_empty() {
            out.push_str(&tool.function.description);
            out.push('\n');
        }
        if let Some(parameters) = &tool.function.parameters {
            if let Ok(schema) = serde_json::to_string(parameters) {
                out.push_str("Parameters: ");
                out.push_str(&schema);
                out.push('\n');
            }
        }
        out.push('\n');
    }

    out.push_str("When calling tools, output only <tool_call> tags with no additional text after them.\n");
    out.push_str("You may output text before tool calls, and you may call multiple tools.\n");

    out
}

/// Shape of the JSON payload inside a `<tool_call>` tag.
#[derive(Deserialize)]
struct TagPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Extract `<tool_call>` tags from model output.
///
/// Returns the cleaned text (successfully parsed tags removed, surrounding
/// whitespace trimmed) and the structured calls. A tag whose payload is not
/// valid JSON, or whose `arguments` is neither an object nor null, is left
/// verbatim in the cleaned text so callers can see the raw output.
///
/// Every extracted call gets a fresh `call_<token>` id.
pub fn parse_tool_calls(text: &str) -> (String, Vec<ToolCall>) {
    let mut calls = Vec::new();
    let mut clean = String::new();
    let mut last_end = 0;

    for caps in TOOL_CALL_RE.captures_iter(text) {
        let full = caps.get(0).expect("group 0 always present");
        let inner = caps.get(1).expect("group 1 always present").as_str();

        let Ok(payload) = serde_json::from_str::<TagPayload>(inner) else {
            continue;
        };
        if !payload.arguments.is_object() && !payload.arguments.is_null() {
            continue;
        }
        let Ok(arguments) = serde_json::to_string(&payload.arguments) else {
            continue;
        };

        clean.push_str(&text[last_end..full.start()]);
        last_end = full.end();

        calls.push(ToolCall {
            id: new_call_id(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: payload.name,
                arguments,
            },
        });
    }

    clean.push_str(&text[last_end..]);
    (clean.trim().to_string(), calls)
}

/// Whether `text` contains a complete tag or the partial opening
/// `<tool_call`, i.e. the model has begun emitting tool-call output.
pub fn has_tool_call_prefix(text: &str) -> bool {
    text.contains(TOOL_CALL_SENTINEL)
}

/// Mint a unique tool-call id: `call_` plus 21 random alphanumerics.
fn new_call_id() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(21)
        .map(char::from)
        .collect();
    format!("call_{token}")
}
