//! Agent runner with the tool calling loop.

use super::events::TurnEvent;
use super::reasoning::{strip_reasoning, ReasoningFilter};
use crate::conversation::{ConversationStore, Message, ToolCallRequest};
use crate::error::{Result, TaskloopError};
use crate::llm::{BoundModel, ResponseMode};
use crate::tools::ToolSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default bound on model invocations per turn.
pub const DEFAULT_MAX_HOPS: usize = 10;

/// Agent that answers user input, running tools until the model stops asking for them.
pub struct Agent {
    model: BoundModel,
    tools: Arc<ToolSet>,
    store: Arc<dyn ConversationStore>,
    max_hops: usize,
    system_prompt: Option<String>,
    mode: ResponseMode,
    strip_reasoning: bool,
}

impl Agent {
    /// Create a new agent over a bound model, its tools and a conversation store.
    pub fn new(model: BoundModel, tools: Arc<ToolSet>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            model,
            tools,
            store,
            max_hops: DEFAULT_MAX_HOPS,
            system_prompt: None,
            mode: ResponseMode::Stream,
            strip_reasoning: true,
        }
    }

    /// Set a system prompt, placed first in every new thread.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    /// Set the maximum number of model invocations per turn. At least one is always allowed.
    pub fn with_max_hops(mut self, max: usize) -> Self {
        self.max_hops = max.max(1);
        self
    }

    pub fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether `<think>` blocks are removed from model text.
    pub fn with_reasoning_stripped(mut self, strip: bool) -> Self {
        self.strip_reasoning = strip;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Run one turn on a thread.
    ///
    /// Events are delivered in order; the last one of a successful turn is
    /// [`TurnEvent::TurnComplete`]. Tool failures are fed back to the model as
    /// error results. Model failures and the hop limit end the turn with an
    /// error, leaving the history as it was at that point.
    pub async fn run_turn<F>(&self, thread_id: &str, input: &str, mut on_event: F) -> Result<AgentResponse>
    where
        F: FnMut(TurnEvent) + Send,
    {
        let mut history = self.store.get(thread_id).await?;

        let mut opening = Vec::with_capacity(2);
        if history.is_empty() {
            if let Some(prompt) = &self.system_prompt {
                opening.push(Message::system(prompt.clone()));
            }
        }
        opening.push(Message::user(input));
        self.store.append(thread_id, &opening).await?;
        history.extend(opening);

        let mut tool_calls_made = Vec::new();

        for hop in 1..=self.max_hops {
            debug!("Turn hop {} on thread {} ({} messages)", hop, thread_id, history.len());

            let mut filter = ReasoningFilter::new(self.strip_reasoning);
            let mut forward = |fragment: &str| {
                let visible = filter.push(fragment);
                if !visible.is_empty() {
                    on_event(TurnEvent::TextFragment(visible));
                }
            };
            let response = self.model.invoke(&history, self.mode, &mut forward).await?;

            let tail = filter.finish();
            if !tail.is_empty() {
                on_event(TurnEvent::TextFragment(tail));
            }

            let content = if self.strip_reasoning {
                strip_reasoning(&response.content)
            } else {
                response.content.clone()
            };

            if !response.requests_tools() {
                self.store
                    .append(thread_id, &[Message::assistant(content.clone())])
                    .await?;

                info!(
                    "Turn on thread {} finished after {} hops and {} tool calls",
                    thread_id,
                    hop,
                    tool_calls_made.len()
                );
                on_event(TurnEvent::TurnComplete {
                    content: content.clone(),
                    hops: hop,
                });

                return Ok(AgentResponse {
                    content,
                    tool_calls: tool_calls_made,
                    hops: hop,
                });
            }

            let assistant = Message::assistant_with_tools(content, response.tool_calls.clone());
            self.store.append(thread_id, std::slice::from_ref(&assistant)).await?;
            history.push(assistant);

            for call in &response.tool_calls {
                on_event(TurnEvent::ToolStarted {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                let record = self.execute_tool_call(call).await;

                let result = Message::tool_result(&call.id, &call.name, &record.result, record.is_error);
                self.store.append(thread_id, std::slice::from_ref(&result)).await?;
                history.push(result);

                on_event(TurnEvent::ToolFinished {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    output: record.result.clone(),
                    is_error: record.is_error,
                });

                tool_calls_made.push(record);
            }
        }

        warn!(
            "Turn on thread {} stopped after {} hops without a final answer",
            thread_id, self.max_hops
        );
        Err(TaskloopError::HopLimit(self.max_hops))
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, call: &ToolCallRequest) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let (result, is_error) = match self.tools.invoke(call).await {
            Ok(output) => (output.text, output.is_error),
            Err(e) if e.is_recoverable() => {
                warn!("Tool {} failed: {}", call.name, e);
                (format!("Error: {}", e), true)
            }
            Err(e) => {
                error!("Tool {} failed unexpectedly: {}", call.name, e);
                (format!("Error: {}", e), true)
            }
        };

        ToolCallRecord {
            call_id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
            is_error,
        }
    }
}

/// Response from a completed turn.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final answer, with reasoning removed when stripping is on.
    pub content: String,
    /// Record of all tool calls made during the turn.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model invocations used.
    pub hops: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub call_id: String,
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result text returned to the model.
    pub result: String,
    pub is_error: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
