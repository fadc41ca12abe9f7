//! Request flattening: OpenAI messages into a role-prefixed prompt.

use serde::Serialize;
use serde_json::Value;

use super::tools::tool_call_instructions;
use crate::chat::QueryOptions;
use crate::oai::{ChatCompletionRequest, ToolCall};

/// Convert an OpenAI chat completion request into a prompt string and
/// [`QueryOptions`] for [`chat::Client::query`](crate::chat::Client::query).
///
/// Messages translate by role:
/// - "system" messages are concatenated into the system prompt;
/// - "user" messages become `[user]: <text>`;
/// - "assistant" messages become `[assistant]: <text>`, with any tool calls
///   re-encoded as `<tool_call>` tags;
/// - "tool" messages become `[tool_result for <call_id>]: <content>`.
///
/// When the request carries tools, [`tool_call_instructions`] is appended to
/// the system prompt. The translation is pure: the same request always
/// yields the same prompt and options.
pub fn request_to_query(req: &ChatCompletionRequest) -> (String, QueryOptions) {
    let mut system_parts: Vec<String> = Vec::new();
    let mut conv_parts: Vec<String> = Vec::new();

    for msg in &req.messages {
        match msg.role.as_str() {
            "system" => system_parts.push(msg.text()),

            "user" => conv_parts.push(format!("[user]: {}", msg.text())),

            "assistant" => {
                let mut text = msg.text();
                if !msg.tool_calls.is_empty() {
                    let mut parts = Vec::new();
                    if !text.is_empty() {
                        parts.push(text);
                    }
                    for call in &msg.tool_calls {
                        parts.push(format!("<tool_call>{}</tool_call>", render_tool_call(call)));
                    }
                    text = parts.join("\n\n");
                }
                conv_parts.push(format!("[assistant]: {text}"));
            }

            "tool" => conv_parts.push(format!(
                "[tool_result for {}]: {}",
                msg.tool_call_id.as_deref().unwrap_or_default(),
                msg.text()
            )),

            _ => {}
        }
    }

    let mut system_prompt = system_parts.join("\n\n");
    if !req.tools.is_empty() {
        system_prompt.push_str(&tool_call_instructions(&req.tools));
    }

    let opts = QueryOptions {
        system_prompt,
        streaming: req.stream,
        model: req.model.clone(),
        effort: None,
    };

    (conv_parts.join("\n\n"), opts)
}

/// Re-encode a structured tool call as the tag payload the model itself
/// would have produced, so conversation history round-trips through the
/// prompt faithfully.
fn render_tool_call(call: &ToolCall) -> String {
    #[derive(Serialize)]
    struct TagPayload<'a> {
        name: &'a str,
        arguments: Value,
    }

    let arguments = serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);
    serde_json::to_string(&TagPayload {
        name: &call.function.name,
        arguments,
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oai::{ChatMessage, FunctionCall, FunctionDefinition, Tool};
    use serde_json::json;

    fn request(messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "sonnet".into(),
            messages,
            ..Default::default()
        }
    }

    #[test]
    fn user_message_round_trip() {
        let (prompt, _) = request_to_query(&request(vec![ChatMessage::text_message(
            "user",
            "What is 2+2?",
        )]));
        assert_eq!(prompt, "[user]: What is 2+2?");
    }

    #[test]
    fn system_messages_join_into_system_prompt() {
        let (prompt, opts) = request_to_query(&request(vec![
            ChatMessage::text_message("system", "You are a pirate."),
            ChatMessage::text_message("system", "Every response must contain 'arrr'."),
            ChatMessage::text_message("user", "How are you today?"),
        ]));
        assert_eq!(
            opts.system_prompt,
            "You are a pirate.\n\nEvery response must contain 'arrr'."
        );
        assert_eq!(prompt, "[user]: How are you today?");
    }

    #[test]
    fn options_mirror_request() {
        let mut req = request(vec![ChatMessage::text_message("user", "hi")]);
        req.stream = true;
        let (_, opts) = request_to_query(&req);
        assert!(opts.streaming);
        assert_eq!(opts.model, "sonnet");
        assert!(opts.effort.is_none());
    }

    #[test]
    fn tools_append_instructions() {
        let mut req = request(vec![
            ChatMessage::text_message("system", "Be helpful."),
            ChatMessage::text_message("user", "What's the weather in Berlin?"),
        ]);
        req.tools = vec![Tool {
            kind: "function".into(),
            function: FunctionDefinition {
                name: "get_weather".into(),
                description: "Get weather".into(),
                parameters: Some(json!({"type": "object"})),
            },
        }];
        let (_, opts) = request_to_query(&req);
        assert!(opts.system_prompt.starts_with("Be helpful."));
        assert!(opts.system_prompt.contains("## Available Tools"));
        assert!(opts.system_prompt.contains("### get_weather"));
    }

    #[test]
    fn tool_followup_conversation() {
        let assistant = ChatMessage {
            role: "assistant".into(),
            tool_calls: vec![ToolCall {
                id: "call_abc".into(),
                kind: "function".into(),
                function: FunctionCall {
                    name: "get_weather".into(),
                    arguments: r#"{"city":"Paris"}"#.into(),
                },
            }],
            ..Default::default()
        };
        let (prompt, _) = request_to_query(&request(vec![
            ChatMessage::text_message("user", "What's the weather in Paris?"),
            assistant,
            ChatMessage::tool_result("call_abc", r#"{"temp_c":18}"#),
            ChatMessage::text_message("user", "Thanks! And in London?"),
        ]));

        assert!(prompt.contains("[assistant]:"));
        assert!(prompt.contains("<tool_call>"));
        assert!(prompt.contains(r#""name":"get_weather""#));
        assert!(prompt.contains(r#""city":"Paris""#));
        assert!(prompt.contains("[tool_result for call_abc]: {\"temp_c\":18}"));
        assert!(prompt.contains("[user]: Thanks! And in London?"));
    }

    #[test]
    fn assistant_text_and_tool_calls_joined() {
        let assistant = ChatMessage {
            role: "assistant".into(),
            content: Some(crate::oai::MessageContent::Text("Checking now.".into())),
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: FunctionCall {
                    name: "lookup".into(),
                    arguments: "{}".into(),
                },
            }],
            ..Default::default()
        };
        let (prompt, _) = request_to_query(&request(vec![assistant]));
        assert!(prompt.starts_with("[assistant]: Checking now.\n\n<tool_call>"));
    }

    #[test]
    fn unparseable_stored_arguments_become_null() {
        let assistant = ChatMessage {
            role: "assistant".into(),
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: FunctionCall {
                    name: "lookup".into(),
                    arguments: "not json".into(),
                },
            }],
            ..Default::default()
        };
        let (prompt, _) = request_to_query(&request(vec![assistant]));
        assert!(prompt.contains(r#"<tool_call>{"name":"lookup","arguments":null}</tool_call>"#));
    }

    #[test]
    fn translation_is_deterministic() {
        let mut req = request(vec![
            ChatMessage::text_message("system", "s"),
            ChatMessage::text_message("user", "u"),
        ]);
        req.tools = vec![Tool {
            kind: "function".into(),
            function: FunctionDefinition {
                name: "t".into(),
                description: String::new(),
                parameters: Some(json!({"a": 1, "b": 2})),
            },
        }];
        let (p1, o1) = request_to_query(&req);
        let (p2, o2) = request_to_query(&req);
        assert_eq!(p1, p2);
        assert_eq!(o1.system_prompt, o2.system_prompt);
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let (prompt, _) = request_to_query(&request(vec![
            ChatMessage::text_message("user", "hi"),
            ChatMessage::text_message("developer", "secret"),
        ]));
        assert_eq!(prompt, "[user]: hi");
    }
}
