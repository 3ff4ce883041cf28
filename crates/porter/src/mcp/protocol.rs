use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP revision this client negotiates during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC response envelope. Exactly one of `result` and `error` is set;
/// notifications from the server carry no `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// One tool as advertised by `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// Result of `tools/call`. The host reports tool failure in-band via
/// `isError` rather than as a JSON-RPC error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolResultContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResultContent {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

impl CallToolResult {
    /// Render the result for insertion into conversation history.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|part| match part {
                ToolResultContent::Text { text } => text.as_str(),
                ToolResultContent::Unsupported => "[non-text content]",
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list_tools_result() {
        let raw = json!({
            "tools": [
                {
                    "name": "read_file",
                    "description": "Read a file from disk",
                    "inputSchema": {"type": "object", "properties": {"path": {"type": "string"}}}
                },
                {
                    "name": "undocumented",
                    "inputSchema": {"type": "object"}
                }
            ]
        });

        let listed: ListToolsResult = serde_json::from_value(raw).unwrap();
        assert_eq!(listed.tools.len(), 2);
        assert_eq!(listed.tools[0].name, "read_file");
        assert_eq!(listed.tools[1].description, "");
    }

    #[test]
    fn test_parse_error_response() {
        let raw = json!({"jsonrpc": "2.0", "id": 3, "error": {"code": -32601, "message": "Method not found"}});
        let response: JsonRpcResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.id, Some(3));
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_call_tool_result_text() {
        let result = CallToolResult {
            content: vec![
                ToolResultContent::Text {
                    text: "first".to_string(),
                },
                ToolResultContent::Text {
                    text: "second".to_string(),
                },
            ],
            is_error: false,
        };
        assert_eq!(result.text(), "first\nsecond");
    }

    #[test]
    fn test_call_tool_result_non_text_placeholder() {
        let raw = json!({
            "content": [
                {"type": "image", "data": "...", "mimeType": "image/png"},
                {"type": "text", "text": "caption"}
            ],
            "isError": false
        });
        let result: CallToolResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.text(), "[non-text content]\ncaption");
    }
}
