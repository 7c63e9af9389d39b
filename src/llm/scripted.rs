//! A chat model that replays scripted replies.
//!
//! Drives the turn loop in tests without a backend.

use super::client::{ChatModel, FragmentSink};
use super::types::{ModelResponse, ToolSpec};
use crate::conversation::{Message, ToolCallRequest};
use crate::error::{Result, TaskloopError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(ModelResponse),
    Fail(String),
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        ScriptedReply::Respond(ModelResponse::text(content))
    }

    pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Self {
        ScriptedReply::Respond(ModelResponse::with_tool_calls(
            "",
            vec![ToolCallRequest::new(id, name, arguments.to_string())],
        ))
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        ScriptedReply::Respond(ModelResponse::with_tool_calls("", calls))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ScriptedReply::Fail(message.into())
    }
}

/// Replays queued replies and records what it was asked.
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    histories: Mutex<Vec<Vec<Message>>>,
    tool_names: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            name: "scripted".to_string(),
            replies: Mutex::new(replies.into_iter().collect()),
            histories: Mutex::new(Vec::new()),
            tool_names: Mutex::new(Vec::new()),
        }
    }

    /// Number of times the model was invoked.
    pub fn invocations(&self) -> usize {
        self.histories.lock().unwrap().len()
    }

    /// The history passed to each invocation, in order.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }

    /// Tool names offered on each invocation.
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.tool_names.lock().unwrap().clone()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next_reply(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        self.histories.lock().unwrap().push(messages.to_vec());
        self.tool_names
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.name.clone()).collect());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TaskloopError::Model("Scripted model has no replies left".to_string()))?;

        match reply {
            ScriptedReply::Respond(response) => Ok(response),
            ScriptedReply::Fail(message) => Err(TaskloopError::Model(message)),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        self.next_reply(messages, tools)
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        on_fragment: FragmentSink<'_>,
    ) -> Result<ModelResponse> {
        let response = self.next_reply(messages, tools)?;
        for word in response.content.split_inclusive(' ') {
            on_fragment(word);
        }
        Ok(response)
    }
}
