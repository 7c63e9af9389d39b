//! Tool descriptors discovered from tool providers.
//!
//! A descriptor pairs a tool's declared schema with the handle that invokes
//! it. The [`ToolSet`] owns every descriptor of a run together with the
//! provider sessions backing them, and releases those sessions on shutdown.

mod schema;

pub use schema::validate_arguments;

use crate::conversation::ToolCallRequest;
use crate::error::{Result, TaskloopError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Result of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text returned to the model.
    pub text: String,
    /// Whether the provider flagged the result as an error.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Invocation capability behind a tool descriptor.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invoke the named tool with already validated arguments.
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolOutput>;
}

/// A live connection to a tool provider that must be released after use.
#[async_trait]
pub trait ProviderSession: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Release the connection. Must be safe to call more than once.
    async fn shutdown(&self);
}

/// An externally provided tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub input_schema: Value,
    /// Name of the provider exposing the tool.
    pub server: String,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Establishes connections to tool providers.
#[async_trait]
pub trait ToolConnector: Send + Sync {
    /// Connect and discover tools. Fails with a connection error when no tools are found.
    async fn establish(&self) -> Result<ToolSet>;
}

/// The tools available to one run, plus the sessions providing them.
pub struct ToolSet {
    descriptors: Vec<ToolDescriptor>,
    sessions: Vec<Arc<dyn ProviderSession>>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl ToolSet {
    /// Build a tool set. Rejects empty sets and duplicate tool names.
    pub fn new(
        descriptors: Vec<ToolDescriptor>,
        sessions: Vec<Arc<dyn ProviderSession>>,
    ) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(TaskloopError::Connection(
                "No tools were loaded from the tool provider".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(TaskloopError::Connection(format!(
                    "Tool '{}' is exposed by more than one server",
                    descriptor.name
                )));
            }
        }

        Ok(Self {
            descriptors,
            sessions,
        })
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Resolve, validate and run a model-requested tool call.
    pub async fn invoke(&self, call: &ToolCallRequest) -> Result<ToolOutput> {
        let descriptor = self.get(&call.name).ok_or_else(|| {
            TaskloopError::Invocation(format!(
                "Unknown tool '{}'. Available tools: {}",
                call.name,
                self.names().join(", ")
            ))
        })?;

        let arguments = call.parsed_arguments()?;
        validate_arguments(&descriptor.name, &descriptor.input_schema, &arguments)?;

        debug!("Invoking {} on server {}", descriptor.name, descriptor.server);
        descriptor.handler.invoke(&descriptor.name, arguments).await
    }

    /// Release all provider sessions.
    pub async fn shutdown(&self) {
        for session in &self.sessions {
            debug!("Shutting down tool provider {}", session.name());
            session.shutdown().await;
        }
    }
}
