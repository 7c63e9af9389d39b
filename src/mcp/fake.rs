//! In-process MCP server used by tests.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};

const PING_ID: &str = "srv-ping";

#[derive(Debug, Clone)]
pub(crate) struct FakeTool {
    name: String,
    schema: Value,
    fails: bool,
}

impl FakeTool {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: json!({ "type": "object", "properties": {} }),
            fails: false,
        }
    }

    /// A tool whose calls always come back as JSON-RPC errors.
    pub(crate) fn failing(name: &str) -> Self {
        Self {
            fails: true,
            ..Self::new(name)
        }
    }

    pub(crate) fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

#[derive(Default)]
struct StateInner {
    calls: Vec<(String, Value)>,
    list_requests: usize,
    pong: bool,
}

/// Observations made by the fake server.
#[derive(Clone, Default)]
pub(crate) struct FakeState(Arc<Mutex<StateInner>>);

impl FakeState {
    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap().calls.clone()
    }

    pub(crate) fn list_requests(&self) -> usize {
        self.0.lock().unwrap().list_requests
    }

    pub(crate) fn pong_received(&self) -> bool {
        self.0.lock().unwrap().pong
    }
}

pub(crate) struct FakeServer {
    tools: Vec<FakeTool>,
    page_size: usize,
    ping_before_list: bool,
    unanswered: Option<&'static str>,
}

impl FakeServer {
    pub(crate) fn new(tools: Vec<FakeTool>) -> Self {
        Self {
            tools,
            page_size: usize::MAX,
            ping_before_list: false,
            unanswered: None,
        }
    }

    pub(crate) fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub(crate) fn ping_before_list(mut self) -> Self {
        self.ping_before_list = true;
        self
    }

    /// Read requests for `method` but never reply to them.
    pub(crate) fn never_answer(mut self, method: &'static str) -> Self {
        self.unanswered = Some(method);
        self
    }

    /// Start serving; returns the client ends of the connection.
    pub(crate) fn start(self) -> (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>, FakeState) {
        let (client_side, server_side) = duplex(64 * 1024);
        let state = FakeState::default();
        let task_state = state.clone();

        tokio::spawn(async move {
            let (read, mut write) = split(server_side);
            let mut lines = BufReader::new(read).lines();
            let mut pinged = false;

            while let Ok(Some(line)) = lines.next_line().await {
                let Ok(message) = serde_json::from_str::<Value>(&line) else {
                    continue;
                };
                let id = message.get("id").cloned().unwrap_or(Value::Null);

                let Some(method) = message.get("method").and_then(Value::as_str) else {
                    if id == json!(PING_ID) {
                        task_state.0.lock().unwrap().pong = true;
                    }
                    continue;
                };

                if self.unanswered.is_some_and(|m| m == method) {
                    continue;
                }

                let reply = match method {
                    "initialize" => Some(success(
                        id,
                        json!({
                            "protocolVersion": "2024-11-05",
                            "capabilities": { "tools": { "listChanged": false } },
                            "serverInfo": { "name": "fake-tasks", "version": "0.0.1" }
                        }),
                    )),
                    "notifications/initialized" => None,
                    "tools/list" => {
                        task_state.0.lock().unwrap().list_requests += 1;

                        if self.ping_before_list && !pinged {
                            pinged = true;
                            let ping = json!({ "jsonrpc": "2.0", "id": PING_ID, "method": "ping" });
                            let _ = write.write_all(format!("{}\n", ping).as_bytes()).await;
                        }

                        let start = message
                            .pointer("/params/cursor")
                            .and_then(Value::as_str)
                            .and_then(|c| c.parse::<usize>().ok())
                            .unwrap_or(0);
                        let end = start.saturating_add(self.page_size).min(self.tools.len());
                        let page: Vec<Value> = self.tools[start..end]
                            .iter()
                            .map(|t| {
                                json!({
                                    "name": t.name,
                                    "description": format!("Fake {}", t.name),
                                    "inputSchema": t.schema
                                })
                            })
                            .collect();
                        let next = (end < self.tools.len()).then(|| end.to_string());

                        Some(success(id, json!({ "tools": page, "nextCursor": next })))
                    }
                    "tools/call" => {
                        let name = message
                            .pointer("/params/name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        let arguments = message
                            .pointer("/params/arguments")
                            .cloned()
                            .unwrap_or(Value::Null);
                        task_state.0.lock().unwrap().calls.push((name.clone(), arguments));

                        let fails = self.tools.iter().any(|t| t.name == name && t.fails);
                        if fails {
                            Some(failure(id, -32000, "quota exceeded"))
                        } else {
                            Some(success(
                                id,
                                json!({
                                    "content": [{ "type": "text", "text": format!("{} done", name) }],
                                    "isError": false
                                }),
                            ))
                        }
                    }
                    _ => Some(failure(id, -32601, "Method not found")),
                };

                if let Some(reply) = reply {
                    if write.write_all(format!("{}\n", reply).as_bytes()).await.is_err() {
                        break;
                    }
                }
            }
        });

        let (reader, writer) = split(client_side);
        (reader, writer, state)
    }
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
