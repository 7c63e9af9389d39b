//! Connects configured MCP servers and turns their tools into descriptors.

use super::client::McpClient;
use super::protocol::Tool;
use crate::config::ServerSettings;
use crate::error::{Result, TaskloopError};
use crate::tools::{ProviderSession, ToolConnector, ToolDescriptor, ToolHandler, ToolOutput, ToolSet};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Invokes a tool on the MCP server that advertised it.
struct McpToolHandler {
    client: Arc<McpClient>,
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolOutput> {
        let result = self.client.call_tool(tool, arguments).await?;
        let text = result.render_text();

        Ok(if result.is_error {
            ToolOutput::error(text)
        } else {
            ToolOutput::text(text)
        })
    }
}

/// Tool connector for the MCP servers of a configuration.
pub struct McpConnector {
    servers: BTreeMap<String, ServerSettings>,
}

impl McpConnector {
    pub fn new(servers: BTreeMap<String, ServerSettings>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl ToolConnector for McpConnector {
    async fn establish(&self) -> Result<ToolSet> {
        let mut started = Vec::with_capacity(self.servers.len());

        for (name, settings) in &self.servers {
            info!("Connecting to MCP server '{}' via '{}'", name, settings.command);
            let limit = Duration::from_secs(settings.startup_timeout_secs);

            match start_within(name, limit, McpClient::spawn(name, settings)).await {
                Ok(server) => started.push(server),
                Err(e) => {
                    release(started.into_iter().map(|(client, _)| client)).await;
                    return Err(e);
                }
            }
        }

        assemble(started).await
    }
}

/// Connect one server and discover its tools, all within `limit`.
///
/// A client dropped on timeout takes its process down with it.
async fn start_within<F>(name: &str, limit: Duration, connect: F) -> Result<(McpClient, Vec<Tool>)>
where
    F: Future<Output = Result<McpClient>>,
{
    let startup = async {
        let client = connect.await?;
        match client.list_tools().await {
            Ok(tools) => Ok((client, tools)),
            Err(e) => {
                client.shutdown().await;
                Err(e)
            }
        }
    };

    match tokio::time::timeout(limit, startup).await {
        Ok(result) => result,
        Err(_) => Err(TaskloopError::Connection(format!(
            "Server '{}' did not finish startup within {:?}",
            name, limit
        ))),
    }
}

/// Discover the tools of connected clients and assemble a tool set.
///
/// All clients are shut down if discovery fails or yields no tools.
pub async fn tool_set_from_clients(clients: Vec<McpClient>) -> Result<ToolSet> {
    let mut started = Vec::with_capacity(clients.len());
    let mut pending = clients.into_iter();

    while let Some(client) = pending.next() {
        match client.list_tools().await {
            Ok(tools) => started.push((client, tools)),
            Err(e) => {
                client.shutdown().await;
                release(started.into_iter().map(|(client, _)| client).chain(pending)).await;
                return Err(e);
            }
        }
    }

    assemble(started).await
}

async fn assemble(started: Vec<(McpClient, Vec<Tool>)>) -> Result<ToolSet> {
    let mut clients = Vec::with_capacity(started.len());
    let mut descriptors = Vec::new();

    for (client, tools) in started {
        let client = Arc::new(client);
        if tools.is_empty() {
            warn!("Server '{}' exposes no tools", client.name());
        }

        let handler: Arc<dyn ToolHandler> = Arc::new(McpToolHandler {
            client: client.clone(),
        });

        descriptors.extend(tools.into_iter().map(|tool| ToolDescriptor {
            description: tool.description.unwrap_or_default(),
            name: tool.name,
            input_schema: tool.input_schema,
            server: client.name().to_string(),
            handler: handler.clone(),
        }));
        clients.push(client);
    }

    let sessions: Vec<Arc<dyn ProviderSession>> = clients
        .iter()
        .map(|c| c.clone() as Arc<dyn ProviderSession>)
        .collect();

    match ToolSet::new(descriptors, sessions) {
        Ok(tools) => {
            info!("Loaded {} tools: {}", tools.len(), tools.names().join(", "));
            Ok(tools)
        }
        Err(e) => {
            for client in &clients {
                client.shutdown().await;
            }
            Err(e)
        }
    }
}

async fn release(clients: impl Iterator<Item = McpClient>) {
    for client in clients {
        client.shutdown().await;
    }
}
