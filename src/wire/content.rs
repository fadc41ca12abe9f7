//! Content block types for assistant messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single content block within an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content.
    Text {
        text: String,
    },
    /// Extended thinking content.
    Thinking {
        thinking: String,
    },
    /// A tool use request from the model.
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    /// A tool result returned to the model.
    ///
    /// The content is kept raw: the CLI emits either a plain string or a
    /// list of blocks, and this proxy never needs to look inside (built-in
    /// tools are disabled on every invocation).
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Extract the text if this is a text block.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Check if this is a text block.
    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_block() {
        let json = r#"{"type": "text", "text": "Hello, world!"}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        assert!(block.is_text());
        assert_eq!(block.text(), Some("Hello, world!"));
    }

    #[test]
    fn parse_thinking_block() {
        let json = r#"{"type": "thinking", "thinking": "Let me consider..."}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        assert_eq!(
            block,
            ContentBlock::Thinking {
                thinking: "Let me consider...".into()
            }
        );
        assert!(block.text().is_none());
    }

    #[test]
    fn parse_tool_use_block() {
        let json = r#"{
            "type": "tool_use",
            "id": "toolu_01234",
            "name": "Bash",
            "input": {"command": "ls -la"}
        }"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        match block {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "toolu_01234");
                assert_eq!(name, "Bash");
                assert_eq!(input["command"], "ls -la");
            }
            other => panic!("expected tool_use, got {:?}", other),
        }
    }

    #[test]
    fn parse_tool_result_string_content() {
        let json = r#"{
            "type": "tool_result",
            "tool_use_id": "toolu_01234",
            "content": "file1.txt\nfile2.txt",
            "is_error": false
        }"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "toolu_01234");
                assert_eq!(content, Value::String("file1.txt\nfile2.txt".into()));
                assert!(!is_error);
            }
            other => panic!("expected tool_result, got {:?}", other),
        }
    }

    #[test]
    fn parse_tool_result_block_content() {
        let json = r#"{
            "type": "tool_result",
            "tool_use_id": "toolu_01234",
            "content": [{"type": "text", "text": "ok"}]
        }"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        match block {
            ContentBlock::ToolResult { content, .. } => assert!(content.is_array()),
            other => panic!("expected tool_result, got {:?}", other),
        }
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let json = r#"{"type": "thinking", "thinking": "hm", "signature": "sig_abc"}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        assert!(matches!(block, ContentBlock::Thinking { .. }));
    }

    #[test]
    fn serialize_text_block() {
        let block = ContentBlock::Text {
            text: "Hello".into(),
        };
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""text":"Hello""#));
    }
}
