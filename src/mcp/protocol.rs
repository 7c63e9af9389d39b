//! MCP protocol types (JSON-RPC 2.0), client side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision announced during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Outgoing JSON-RPC request or notification.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    /// A request without id; the server sends no response.
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }
}

/// Outgoing JSON-RPC response, used to answer server-initiated requests.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any incoming JSON-RPC message: a response, a request or a notification.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl IncomingMessage {
    /// Whether this message answers the request with the given id.
    pub fn is_response_to(&self, request_id: u64) -> bool {
        self.method.is_none()
            && self
                .id
                .as_ref()
                .and_then(Value::as_u64)
                .is_some_and(|id| id == request_id)
    }
}

/// Name and version of a client or server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// MCP initialize request params.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: Implementation,
}

/// MCP initialize response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: Option<Implementation>,
}

/// Tool definition advertised by a server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Tools list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsListResult {
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Tool call request params.
#[derive(Debug, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// Tool call response.
#[derive(Debug, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "mimeType", default)]
        mime_type: Option<String>,
    },
    Audio {
        #[serde(rename = "mimeType", default)]
        mime_type: Option<String>,
    },
    Resource {
        #[serde(default)]
        resource: Value,
    },
    #[serde(other)]
    Unsupported,
}

impl ToolContent {
    /// Render a content item for the model.
    pub fn render(&self) -> String {
        match self {
            ToolContent::Text { text } => text.clone(),
            ToolContent::Image { mime_type } => placeholder("image", mime_type.as_deref()),
            ToolContent::Audio { mime_type } => placeholder("audio", mime_type.as_deref()),
            ToolContent::Resource { resource } => match resource.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => {
                    let uri = resource.get("uri").and_then(Value::as_str).unwrap_or("unknown");
                    format!("[resource {}]", uri)
                }
            },
            ToolContent::Unsupported => "[unsupported content]".to_string(),
        }
    }
}

fn placeholder(kind: &str, mime_type: Option<&str>) -> String {
    match mime_type {
        Some(mime) => format!("[{} content: {}]", kind, mime),
        None => format!("[{} content]", kind),
    }
}

impl ToolCallResult {
    /// Join all content items into the text handed back to the model.
    pub fn render_text(&self) -> String {
        self.content
            .iter()
            .map(ToolContent::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_has_no_id() {
        let value = serde_json::to_value(JsonRpcRequest::notification("notifications/initialized", None)).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
        assert_eq!(value["jsonrpc"], "2.0");
    }

    #[test]
    fn test_initialize_params_are_camel_case() {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation {
                name: "taskloop".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(params).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["clientInfo"]["name"], "taskloop");
    }

    #[test]
    fn test_tool_without_schema_gets_empty_object() {
        let tool: Tool = serde_json::from_value(json!({ "name": "list_tasks" })).unwrap();
        assert_eq!(tool.input_schema["type"], "object");
        assert!(tool.description.is_none());
    }

    #[test]
    fn test_render_mixed_content() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Task created" },
                { "type": "image", "data": "AAAA", "mimeType": "image/png" },
                { "type": "resource", "resource": { "uri": "tasks://1", "text": "NBA project" } },
                { "type": "something_new" }
            ],
            "isError": false
        }))
        .unwrap();

        assert_eq!(
            result.render_text(),
            "Task created\n[image content: image/png]\nNBA project\n[unsupported content]"
        );
    }

    #[test]
    fn test_is_response_to_matches_numeric_id_only() {
        let response: IncomingMessage = serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 3, "result": {} })).unwrap();
        assert!(response.is_response_to(3));
        assert!(!response.is_response_to(4));

        let request: IncomingMessage = serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" })).unwrap();
        assert!(!request.is_response_to(3));
    }
}
