//! Tools command implementation.

use super::check_requirements;
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::McpConnector;
use crate::tools::ToolConnector;
use anyhow::Result;

/// Connect to every configured server and list the tools they expose.
pub async fn run_tools(settings: Settings) -> Result<()> {
    check_requirements(&settings)?;

    let connector = McpConnector::new(settings.servers.clone());
    let spinner = Output::spinner("Connecting to MCP servers...");
    let established = connector.establish().await;
    spinner.finish_and_clear();

    let tools = match established {
        Ok(tools) => tools,
        Err(e) => {
            Output::error(&format!("Failed to load tools: {}", e));
            return Err(e.into());
        }
    };

    Output::header(&format!("Tools ({})", tools.len()));
    println!();
    for descriptor in tools.descriptors() {
        Output::tool_info(&descriptor.name, &descriptor.server, &descriptor.description);
    }
    println!();
    Output::kv("Servers", &settings.servers.keys().cloned().collect::<Vec<_>>().join(", "));

    tools.shutdown().await;
    Ok(())
}
