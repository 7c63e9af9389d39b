//! Chat model abstraction.

use super::types::{ModelResponse, ToolSpec};
use crate::conversation::Message;
use crate::error::Result;
use async_trait::async_trait;

/// Callback receiving streamed text fragments.
pub type FragmentSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// A chat-capable language model that may request tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model name for logs and output.
    fn name(&self) -> &str;

    /// Produce a complete response for the history.
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse>;

    /// Produce a response, forwarding text fragments as they arrive.
    ///
    /// Backends without streaming deliver the whole text as one fragment.
    async fn stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        on_fragment: FragmentSink<'_>,
    ) -> Result<ModelResponse> {
        let response = self.complete(messages, tools).await?;
        if !response.content.is_empty() {
            on_fragment(&response.content);
        }
        Ok(response)
    }
}
