//! Non-streaming response assembly from wire messages.

use std::time::{SystemTime, UNIX_EPOCH};

use super::tools::parse_tool_calls;
use crate::oai::{ChatCompletionResponse, ChatMessage, Choice, MessageContent, Usage};
use crate::wire::{AssistantMessage, ResultMessage};

/// Build an OpenAI-compatible response from the final result message and
/// the last assistant message (which may be absent if only a result was
/// received).
///
/// When `has_tools` is set, the response text is scanned for `<tool_call>`
/// tags; any found set the finish reason to "tool_calls", otherwise "stop".
/// Usage comes from the result's session-wide counters with all input
/// categories summed into prompt tokens.
pub fn result_to_response(
    result: &ResultMessage,
    assistant: Option<&AssistantMessage>,
    has_tools: bool,
) -> ChatCompletionResponse {
    let text = match assistant {
        Some(assistant) => assistant.text(),
        None => result.result.clone(),
    };

    let mut message = ChatMessage {
        role: "assistant".to_string(),
        ..Default::default()
    };
    let mut finish_reason = "stop".to_string();

    if has_tools {
        let (clean_text, tool_calls) = parse_tool_calls(&text);
        if !tool_calls.is_empty() {
            message.tool_calls = tool_calls;
            finish_reason = "tool_calls".to_string();
        }
        if !clean_text.is_empty() {
            message.content = Some(MessageContent::Text(clean_text));
        }
    } else {
        message.content = Some(MessageContent::Text(text));
    }

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", result.session_id),
        object: "chat.completion".to_string(),
        created: unix_now(),
        model: model_from_result(result, assistant),
        choices: vec![Choice {
            index: 0,
            message,
            finish_reason,
        }],
        usage: Some(Usage {
            prompt_tokens: result.usage.prompt_tokens(),
            completion_tokens: result.usage.output_tokens,
            total_tokens: result.usage.total_tokens(),
        }),
        system_fingerprint: String::new(),
    }
}

fn model_from_result(result: &ResultMessage, assistant: Option<&AssistantMessage>) -> String {
    if let Some(assistant) = assistant {
        if !assistant.message.model.is_empty() {
            return assistant.message.model.clone();
        }
    }
    if let Some(model) = result.model_usage.keys().next() {
        return model.clone();
    }
    "unknown".to_string()
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
