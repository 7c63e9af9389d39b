//! Conversation messages and the tool pairing check.

use crate::error::{Result, TaskloopError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call identifier echoed back by the matching tool result.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Raw JSON arguments as emitted by the model.
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the arguments as a JSON value. Empty arguments mean an empty object.
    pub fn parsed_arguments(&self) -> Result<serde_json::Value> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments).map_err(|e| {
            TaskloopError::Invocation(format!("Invalid arguments for '{}': {}", self.name, e))
        })
    }
}

impl std::fmt::Display for ToolCallRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// One entry in a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Message::Tool {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
            is_error,
        }
    }

    /// Tool calls carried by an assistant message.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Verify that every tool result directly follows the assistant message that requested it.
///
/// Only tool results of the same batch may sit between a request and its result,
/// and each call id is answered at most once.
pub fn check_tool_pairing(messages: &[Message]) -> Result<()> {
    let mut pending: HashSet<&str> = HashSet::new();

    for (index, message) in messages.iter().enumerate() {
        match message {
            Message::Tool { call_id, .. } => {
                if !pending.remove(call_id.as_str()) {
                    return Err(TaskloopError::InvalidInput(format!(
                        "Tool result '{}' at position {} has no matching pending tool call",
                        call_id, index
                    )));
                }
            }
            Message::Assistant { tool_calls, .. } => {
                pending = tool_calls.iter().map(|c| c.id.as_str()).collect();
            }
            Message::System { .. } | Message::User { .. } => pending.clear(),
        }
    }

    Ok(())
}
