//! MCP client session over a child process' stdio.

use super::protocol::{
    Implementation, InitializeParams, InitializeResult, Tool, ToolCallParams, ToolCallResult,
    ToolsListResult, PROTOCOL_VERSION,
};
use super::transport::Transport;
use crate::config::ServerSettings;
use crate::error::{Result, TaskloopError};
use crate::tools::ProviderSession;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const CLIENT_NAME: &str = "taskloop";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time a server gets to exit after its input is closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A connected and initialized MCP server.
pub struct McpClient {
    name: String,
    transport: Mutex<Transport>,
    child: Mutex<Option<Child>>,
    server_info: Option<Implementation>,
}

impl McpClient {
    /// Launch a server process and perform the MCP handshake.
    #[instrument(skip(settings), fields(command = %settings.command))]
    pub async fn spawn(name: &str, settings: &ServerSettings) -> Result<Self> {
        let mut command = Command::new(&settings.command);
        command
            .args(&settings.args)
            .envs(&settings.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = settings.cwd_path() {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TaskloopError::Connection(format!(
                "Could not start '{}' for server '{}': executable or working directory not found",
                settings.command, name
            )),
            _ => TaskloopError::Connection(format!(
                "Could not start '{}' for server '{}': {}",
                settings.command, name, e
            )),
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TaskloopError::Connection(format!("No stdin for server '{}'", name)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TaskloopError::Connection(format!("No stdout for server '{}'", name)))?;

        if let Some(stderr) = child.stderr.take() {
            let server = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server, "{}", line);
                }
            });
        }

        debug!("Spawned server '{}' (pid {:?})", name, child.id());

        let mut client = Self::from_transport(name, Transport::new(name, stdout, stdin));
        client.child = Mutex::new(Some(child));
        client.initialize().await?;
        Ok(client)
    }

    /// Perform the MCP handshake over arbitrary streams.
    pub async fn connect<R, W>(name: &str, reader: R, writer: W) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut client = Self::from_transport(name, Transport::new(name, reader, writer));
        client.initialize().await?;
        Ok(client)
    }

    fn from_transport(name: &str, transport: Transport) -> Self {
        Self {
            name: name.to_string(),
            transport: Mutex::new(transport),
            child: Mutex::new(None),
            server_info: None,
        }
    }

    async fn initialize(&mut self) -> Result<()> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let transport = self.transport.get_mut();
        let value = transport
            .request("initialize", Some(serde_json::to_value(params)?))
            .await
            .map_err(|e| connection_error(&self.name, "initialize", e))?;
        let result: InitializeResult = serde_json::from_value(value).map_err(|e| {
            TaskloopError::Connection(format!("Invalid initialize result from '{}': {}", self.name, e))
        })?;

        if result.protocol_version != PROTOCOL_VERSION {
            warn!(
                "Server '{}' negotiated protocol {} (requested {})",
                self.name, result.protocol_version, PROTOCOL_VERSION
            );
        }

        transport
            .notify("notifications/initialized", None)
            .await
            .map_err(|e| connection_error(&self.name, "initialize", e))?;

        if let Some(info) = &result.server_info {
            info!("Connected to {} {} as '{}'", info.name, info.version, self.name);
        }
        self.server_info = result.server_info;
        Ok(())
    }

    /// Server name from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name and version the server reported during the handshake.
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// List all tools, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut transport = self.transport.lock().await;
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let value = transport
                .request("tools/list", params)
                .await
                .map_err(|e| connection_error(&self.name, "list tools", e))?;
            let page: ToolsListResult = serde_json::from_value(value).map_err(|e| {
                TaskloopError::Connection(format!("Invalid tools/list result from '{}': {}", self.name, e))
            })?;

            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Server '{}' exposes {} tools", self.name, tools.len());
        Ok(tools)
    }

    /// Call a tool. Any failure is reported as an invocation error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments,
        })?;

        let value = self
            .transport
            .lock()
            .await
            .request("tools/call", Some(params))
            .await
            .map_err(|e| match e {
                TaskloopError::Protocol { code, message } => {
                    TaskloopError::Invocation(format!("{} (code {})", message, code))
                }
                other => TaskloopError::Invocation(other.to_string()),
            })?;

        serde_json::from_value(value).map_err(|e| {
            TaskloopError::Invocation(format!("Invalid tools/call result from '{}': {}", self.name, e))
        })
    }
}

#[async_trait]
impl ProviderSession for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self) {
        self.transport.lock().await.close().await;

        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("Server '{}' exited with {}", self.name, status),
            Ok(Err(e)) => warn!("Waiting for server '{}' failed: {}", self.name, e),
            Err(_) => {
                debug!("Server '{}' did not exit, killing it", self.name);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill server '{}': {}", self.name, e);
                }
            }
        }
    }
}

/// Map handshake and discovery failures to connection errors.
fn connection_error(server: &str, action: &str, e: TaskloopError) -> TaskloopError {
    match e {
        TaskloopError::Connection(_) => e,
        other => TaskloopError::Connection(format!(
            "Failed to {} on server '{}': {}",
            action, server, other
        )),
    }
}
