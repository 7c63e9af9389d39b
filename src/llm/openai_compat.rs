//! Chat model backed by an OpenAI-compatible chat completions endpoint.

use super::client::{ChatModel, FragmentSink};
use super::types::{ModelResponse, ToolSpec};
use crate::config::ModelSettings;
use crate::conversation::{Message, ToolCallRequest};
use crate::error::{Result, TaskloopError};
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCallChunk,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolType,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Chat model talking to Ollama, OpenAI or any compatible server.
pub struct OpenAiCompatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiCompatModel {
    /// Create a model from settings.
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.name.clone(),
            temperature: settings.temperature,
        })
    }

    /// Use a different model name on the same backend.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        stream: bool,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);

        if !tools.is_empty() {
            args.tools(tools.iter().map(to_chat_tool).collect::<Vec<_>>());
        }
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        if stream {
            args.stream(true);
        }

        args.build().map_err(model_error)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        let request = self.build_request(messages, tools, false)?;
        let response = self.client.chat().create(request).await.map_err(model_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TaskloopError::Model("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
            .collect();

        Ok(ModelResponse::with_tool_calls(
            choice.message.content.unwrap_or_default(),
            tool_calls,
        ))
    }

    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        on_fragment: FragmentSink<'_>,
    ) -> Result<ModelResponse> {
        let request = self.build_request(messages, tools, true)?;
        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(model_error)?;

        let mut content = String::new();
        let mut tool_calls = ToolCallAccumulator::default();
        let mut chunks = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(model_error)?;
            chunks += 1;

            for choice in chunk.choices.into_iter().filter(|c| c.index == 0) {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        on_fragment(&text);
                        content.push_str(&text);
                    }
                }
                for call in choice.delta.tool_calls.unwrap_or_default() {
                    tool_calls.push(call);
                }
            }
        }

        debug!("Stream finished after {} chunks", chunks);
        Ok(ModelResponse::with_tool_calls(content, tool_calls.finish()))
    }
}

fn model_error(e: OpenAIError) -> TaskloopError {
    TaskloopError::Model(e.to_string())
}

fn to_chat_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: (!spec.description.is_empty()).then(|| spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

fn to_openai_tool_call(call: &ToolCallRequest) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let built: std::result::Result<ChatCompletionRequestMessage, OpenAIError> = match message {
        Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.as_str())
            .build()
            .map(Into::into),
        Message::User { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.as_str())
            .build()
            .map(Into::into),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !content.is_empty() {
                args.content(content.as_str());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(tool_calls.iter().map(to_openai_tool_call).collect::<Vec<_>>());
            }
            args.build().map(Into::into)
        }
        Message::Tool {
            call_id, content, ..
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id.as_str())
            .content(content.as_str())
            .build()
            .map(Into::into),
    };

    built.map_err(model_error)
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Reassembles tool calls from streamed deltas.
///
/// Deltas are grouped by their index. A new id arriving on an index that
/// already has a different id starts a new call, since some servers reuse
/// index 0 for every call.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    calls: Vec<PartialToolCall>,
    by_index: HashMap<u32, usize>,
}

impl ToolCallAccumulator {
    fn push(&mut self, chunk: ChatCompletionMessageToolCallChunk) {
        let id = chunk.id.filter(|id| !id.is_empty());

        let existing = self.by_index.get(&chunk.index).copied().filter(|&pos| {
            let current = &self.calls[pos].id;
            match &id {
                Some(id) => current.is_empty() || current == id,
                None => true,
            }
        });

        let pos = match existing {
            Some(pos) => pos,
            None => {
                self.calls.push(PartialToolCall::default());
                let pos = self.calls.len() - 1;
                self.by_index.insert(chunk.index, pos);
                pos
            }
        };

        let call = &mut self.calls[pos];
        if let Some(id) = id {
            call.id = id;
        }
        if let Some(function) = chunk.function {
            if let Some(name) = function.name {
                call.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    fn finish(self) -> Vec<ToolCallRequest> {
        self.calls
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| ToolCallRequest::new(c.id, c.name, c.arguments))
            .collect()
    }
}
