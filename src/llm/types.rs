//! Request and response types shared by chat model backends.

use crate::conversation::ToolCallRequest;
use crate::tools::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for ToolSpec {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: descriptor.input_schema.clone(),
        }
    }
}

/// What the model produced for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Text content. May be empty when only tool calls were produced.
    pub content: String,
    /// Requested tool calls, in the order the model emitted them.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    /// Whether the model asked for at least one tool call.
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// How the model output is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Wait for the complete response.
    Complete,
    /// Forward text fragments as they are generated.
    Stream,
}
