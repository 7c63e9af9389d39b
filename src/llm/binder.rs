//! Binds discovered tools to a chat model.

use super::client::{ChatModel, FragmentSink};
use super::types::{ModelResponse, ResponseMode, ToolSpec};
use crate::conversation::Message;
use crate::error::{Result, TaskloopError};
use crate::tools::ToolDescriptor;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A chat model that is offered a fixed set of tools on every invocation.
#[derive(Clone)]
pub struct BoundModel {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolSpec>,
}

/// Bind tool descriptors to a model.
pub fn bind(model: Arc<dyn ChatModel>, descriptors: &[ToolDescriptor]) -> BoundModel {
    let tools: Vec<ToolSpec> = descriptors.iter().map(ToolSpec::from).collect();
    debug!("Bound {} tools to model {}", tools.len(), model.name());
    BoundModel { model, tools }
}

impl BoundModel {
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Invoke the model on a history.
    ///
    /// Tool calls without an id, or reusing one already seen in the batch,
    /// get a generated id so every result pairs with exactly one call.
    pub async fn invoke(
        &self,
        history: &[Message],
        mode: ResponseMode,
        on_fragment: FragmentSink<'_>,
    ) -> Result<ModelResponse> {
        let result = match mode {
            ResponseMode::Complete => self.model.complete(history, &self.tools).await,
            ResponseMode::Stream => self.model.stream(history, &self.tools, on_fragment).await,
        };

        let mut response = result.map_err(|e| match e {
            TaskloopError::Model(_) => e,
            other => TaskloopError::Model(other.to_string()),
        })?;

        let mut seen = HashSet::new();
        for call in &mut response.tool_calls {
            if call.id.trim().is_empty() || seen.contains(&call.id) {
                let fresh = format!("call_{}", Uuid::new_v4().simple());
                debug!("Renaming tool call id '{}' of {} to {}", call.id, call.name, fresh);
                call.id = fresh;
            }
            seen.insert(call.id.clone());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ToolCallRequest;
    use crate::llm::{ScriptedModel, ScriptedReply};
    use crate::tools::{ToolHandler, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn invoke(&self, _tool: &str, _arguments: Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text(""))
        }
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{} tool", name),
            input_schema: json!({ "type": "object" }),
            server: "gtasks".to_string(),
            handler: Arc::new(Noop),
        }
    }

    #[tokio::test]
    async fn test_bound_tools_are_offered_each_call() {
        let model = Arc::new(ScriptedModel::new([ScriptedReply::text("a"), ScriptedReply::text("b")]));
        let bound = bind(model.clone(), &[descriptor("list_tasks"), descriptor("create_task")]);

        let mut sink = |_: &str| {};
        bound.invoke(&[Message::user("x")], ResponseMode::Complete, &mut sink).await.unwrap();
        bound.invoke(&[Message::user("y")], ResponseMode::Stream, &mut sink).await.unwrap();

        let offered = model.offered_tools();
        assert_eq!(offered.len(), 2);
        assert!(offered.iter().all(|t| t == &["list_tasks", "create_task"]));
        assert_eq!(bound.tools()[0].description, "list_tasks tool");
    }

    #[tokio::test]
    async fn test_missing_call_ids_are_generated() {
        let model = Arc::new(ScriptedModel::new([ScriptedReply::tool_calls(vec![
            ToolCallRequest::new("", "list_tasks", "{}"),
            ToolCallRequest::new("keep-me", "list_tasks", "{}"),
        ])]));
        let bound = bind(model, &[descriptor("list_tasks")]);

        let mut sink = |_: &str| {};
        let response = bound
            .invoke(&[Message::user("x")], ResponseMode::Complete, &mut sink)
            .await
            .unwrap();

        assert!(response.tool_calls[0].id.starts_with("call_"));
        assert_eq!(response.tool_calls[1].id, "keep-me");
    }

    #[tokio::test]
    async fn test_repeated_call_ids_are_made_unique() {
        let model = Arc::new(ScriptedModel::new([ScriptedReply::tool_calls(vec![
            ToolCallRequest::new("call_0", "list_tasks", r#"{"list":"work"}"#),
            ToolCallRequest::new("call_0", "list_tasks", r#"{"list":"home"}"#),
            ToolCallRequest::new("call_1", "list_tasks", "{}"),
        ])]));
        let bound = bind(model, &[descriptor("list_tasks")]);

        let mut sink = |_: &str| {};
        let response = bound
            .invoke(&[Message::user("x")], ResponseMode::Complete, &mut sink)
            .await
            .unwrap();

        let ids: Vec<&str> = response.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids[0], "call_0");
        assert_ne!(ids[1], "call_0");
        assert!(ids[1].starts_with("call_"));
        assert_eq!(ids[2], "call_1");
        assert_eq!(response.tool_calls[1].arguments, r#"{"list":"home"}"#);
    }

    #[tokio::test]
    async fn test_backend_failure_is_model_error() {
        let model = Arc::new(ScriptedModel::new([ScriptedReply::fail("connection refused")]));
        let bound = bind(model, &[descriptor("list_tasks")]);

        let mut sink = |_: &str| {};
        let err = bound
            .invoke(&[Message::user("x")], ResponseMode::Complete, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskloopError::Model(_)));
    }
}
