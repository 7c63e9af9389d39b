//! CLI command implementations.

mod chat;
mod config;
mod run;
mod tools;

pub use chat::run_chat;
pub use config::run_config;
pub use run::run_prompt;
pub use tools::run_tools;

use crate::agent::Session;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::conversation::MemoryConversationStore;
use crate::llm::{OpenAiCompatModel, ResponseMode};
use crate::mcp::McpConnector;
use anyhow::Result;
use std::sync::Arc;

/// Run pre-flight checks, printing warnings and failures.
fn check_requirements(settings: &Settings) -> Result<()> {
    match preflight::check(settings) {
        Ok(warnings) => {
            for warning in &warnings {
                Output::warning(warning);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Output::info("Run 'taskloop config show' to review the configuration.");
            Err(e.into())
        }
    }
}

/// Check requirements, connect to the servers and bind their tools to the model.
async fn open_session(settings: &Settings, model: Option<String>, mode: ResponseMode) -> Result<Session> {
    check_requirements(settings)?;

    let mut model_settings = settings.model.clone();
    if let Some(name) = model {
        model_settings.name = name;
    }
    let chat_model = Arc::new(OpenAiCompatModel::new(&model_settings)?);
    let connector = McpConnector::new(settings.servers.clone());
    let store = Arc::new(MemoryConversationStore::new());

    let spinner = Output::spinner("Connecting to MCP servers...");
    let session = Session::start(&connector, chat_model, store, &settings.agent, mode).await;
    spinner.finish_and_clear();

    match session {
        Ok(session) => Ok(session),
        Err(e) => {
            Output::error(&format!("Failed to start session: {}", e));
            Err(e.into())
        }
    }
}
