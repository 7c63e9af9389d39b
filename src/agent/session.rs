//! A running session: tools established, model bound, agent ready.

use super::runner::Agent;
use crate::config::AgentSettings;
use crate::conversation::ConversationStore;
use crate::error::Result;
use crate::llm::{bind, ChatModel, ResponseMode};
use crate::tools::{ToolConnector, ToolSet};
use std::sync::Arc;
use tracing::info;

pub struct Session {
    agent: Agent,
    tools: Arc<ToolSet>,
}

impl Session {
    /// Establish tools through the connector, then bind them to the model.
    ///
    /// Nothing is bound if establishing fails, including when no tools are found.
    pub async fn start(
        connector: &dyn ToolConnector,
        model: Arc<dyn ChatModel>,
        store: Arc<dyn ConversationStore>,
        settings: &AgentSettings,
        mode: ResponseMode,
    ) -> Result<Self> {
        let tools = Arc::new(connector.establish().await?);
        let bound = bind(model, tools.descriptors());

        let agent = Agent::new(bound, tools.clone(), store)
            .with_system_prompt(settings.system_prompt.clone())
            .with_max_hops(settings.max_hops)
            .with_reasoning_stripped(settings.strip_reasoning)
            .with_response_mode(mode);

        info!(
            "Session ready: model {} with {} tools",
            agent.model_name(),
            tools.len()
        );

        Ok(Self { agent, tools })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Release every provider connection.
    pub async fn shutdown(self) {
        self.tools.shutdown().await;
    }
}
