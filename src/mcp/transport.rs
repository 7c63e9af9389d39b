//! Newline-delimited JSON-RPC over a pair of byte streams.

use super::protocol::{IncomingMessage, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND};
use crate::error::{Result, TaskloopError};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace, warn};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Sequential request/response channel to one MCP server.
pub struct Transport {
    server: String,
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    next_id: u64,
}

impl Transport {
    /// Create a transport over the server's output (`reader`) and input (`writer`).
    pub fn new<R, W>(server: &str, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            server: server.to_string(),
            reader: BufReader::new(Box::new(reader)),
            writer: Box::new(writer),
            next_id: 1,
        }
    }

    /// Send a request and wait for its response.
    ///
    /// Server-initiated traffic arriving in between is handled inline.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        debug!("-> {} {} (id {})", self.server, method, id);
        self.write_message(&JsonRpcRequest::new(id, method, params)).await?;

        loop {
            let message = self.read_message().await?;

            if let Some(server_method) = message.method.as_deref() {
                self.handle_server_message(server_method, message.id.clone()).await?;
                continue;
            }

            if !message.is_response_to(id) {
                warn!(
                    "{} sent a response for unknown request {:?}, ignoring",
                    self.server, message.id
                );
                continue;
            }

            if let Some(error) = message.error {
                return Err(TaskloopError::Protocol {
                    code: error.code,
                    message: error.message,
                });
            }

            return Ok(message.result.unwrap_or(Value::Null));
        }
    }

    /// Send a notification.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        debug!("-> {} {} (notification)", self.server, method);
        self.write_message(&JsonRpcRequest::notification(method, params)).await
    }

    /// Close the server's input stream.
    pub async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!("Closing input of {} failed: {}", self.server, e);
        }
    }

    async fn handle_server_message(&mut self, method: &str, id: Option<Value>) -> Result<()> {
        match id {
            None => {
                debug!("<- {} notification {}", self.server, method);
                Ok(())
            }
            Some(id) if method == "ping" => {
                trace!("<- {} ping", self.server);
                self.write_message(&JsonRpcResponse::success(id, json!({})))
                    .await
            }
            Some(id) => {
                warn!("{} sent unsupported request {}", self.server, method);
                let response = JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {}", method),
                );
                self.write_message(&response).await
            }
        }
    }

    async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error("write to", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| self.io_error("flush", e))
    }

    async fn read_message(&mut self) -> Result<IncomingMessage> {
        let mut line = String::new();

        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| TaskloopError::Connection(format!("Failed to read from {}: {}", self.server, e)))?;

            if read == 0 {
                return Err(TaskloopError::Connection(format!(
                    "{} closed the connection",
                    self.server
                )));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<IncomingMessage>(trimmed) {
                Ok(message) => return Ok(message),
                Err(_) => {
                    // Some servers log to stdout.
                    warn!("Ignoring non JSON-RPC output from {}: {}", self.server, trimmed);
                }
            }
        }
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> TaskloopError {
        TaskloopError::Connection(format!("Failed to {} {}: {}", action, self.server, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_request_skips_noise_and_answers_ping() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = split(client);
        let (server_read, mut server_write) = split(server);

        let server_task = tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            let request: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(request["method"], "tools/list");

            let script = format!(
                "starting up...\n\n{}\n{}\n{}\n",
                json!({ "jsonrpc": "2.0", "method": "notifications/message", "params": {} }),
                json!({ "jsonrpc": "2.0", "id": "srv-1", "method": "ping" }),
                json!({ "jsonrpc": "2.0", "id": request["id"], "result": { "tools": [] } }),
            );
            server_write.write_all(script.as_bytes()).await.unwrap();

            let pong: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
            pong
        });

        let mut transport = Transport::new("fake", client_read, client_write);
        let result = transport.request("tools/list", None).await.unwrap();
        assert_eq!(result, json!({ "tools": [] }));

        let pong = server_task.await.unwrap();
        assert_eq!(pong["id"], "srv-1");
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn test_error_response_becomes_protocol_error() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = split(client);
        let (server_read, mut server_write) = split(server);

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            let request: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
            let reply = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": { "code": -32602, "message": "Invalid params" }
            });
            server_write.write_all(format!("{}\n", reply).as_bytes()).await.unwrap();
        });

        let mut transport = Transport::new("fake", client_read, client_write);
        let err = transport.request("tools/call", Some(json!({}))).await.unwrap_err();
        assert!(matches!(err, TaskloopError::Protocol { code: -32602, .. }));
    }

    #[tokio::test]
    async fn test_closed_stream_is_connection_error() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = split(client);
        drop(server);

        let mut transport = Transport::new("fake", client_read, client_write);
        let err = transport.request("initialize", None).await.unwrap_err();
        assert!(matches!(err, TaskloopError::Connection(_)));
    }
}
