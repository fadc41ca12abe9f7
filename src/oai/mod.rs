//! OpenAI-compatible chat completion types and an embedded client.

mod chunk;
mod client;
mod request;
mod response;

pub use chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use client::{ChatCompletionStream, OaiClient};
pub use request::{
    ChatCompletionRequest, ChatMessage, ContentPart, FunctionCall, FunctionDefinition,
    MessageContent, Tool, ToolCall,
};
pub use response::{
    ChatCompletionResponse, Choice, ErrorDetail, ErrorResponse, ModelInfo, ModelList, Usage,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatCompletionRequest>();
        assert_send_sync::<ChatCompletionResponse>();
        assert_send_sync::<ChatCompletionChunk>();
        assert_send_sync::<ToolCall>();
        assert_send_sync::<OaiClient>();
    }
}
