use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{PorterError, PorterResult};
use crate::host::ToolHost;
use crate::mcp::protocol::{CallToolParams, CallToolResult, ListToolsResult, PROTOCOL_VERSION};
use crate::mcp::transport::Transport;
use crate::models::tool::{Tool, ToolCall};

/// The registry adapter: discovers tools from an MCP host and dispatches
/// invocations to it, validating names against the last-discovered set
/// before anything goes over the wire.
pub struct McpClient {
    transport: Box<dyn Transport>,
    tools: RwLock<Vec<Tool>>,
    call_timeout: Option<Duration>,
}

impl McpClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            tools: RwLock::new(Vec::new()),
            call_timeout: None,
        }
    }

    /// Bound the duration of a single tool invocation. Without this, a call
    /// blocks for as long as the host takes.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Perform the MCP handshake. Must complete before discovery.
    pub async fn initialize(&self) -> PorterResult<()> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "porter",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let result = self.transport.request("initialize", params).await?;

        let server = result
            .get("serverInfo")
            .and_then(|info| info.get("name"))
            .and_then(|name| name.as_str())
            .unwrap_or("unknown");
        debug!(server, "MCP session initialized");

        self.transport
            .notify("notifications/initialized", json!({}))
            .await
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> PorterResult<()> {
        self.transport.close().await
    }
}

#[async_trait]
impl ToolHost for McpClient {
    fn tools(&self) -> Vec<Tool> {
        self.tools.read().unwrap().clone()
    }

    async fn discover(&self) -> PorterResult<Vec<Tool>> {
        let result = self.transport.request("tools/list", Value::Null).await?;
        let listed: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| PorterError::Protocol(format!("malformed tools/list result: {e}")))?;

        let tools: Vec<Tool> = listed
            .tools
            .into_iter()
            .map(|tool| Tool::new(tool.name, tool.description, tool.input_schema))
            .collect();

        *self.tools.write().unwrap() = tools.clone();
        Ok(tools)
    }

    async fn call(&self, call: ToolCall) -> PorterResult<CallToolResult> {
        let known = self
            .tools
            .read()
            .unwrap()
            .iter()
            .any(|tool| tool.name == call.name);
        if !known {
            return Err(PorterError::ToolNotFound(call.name));
        }

        let params = serde_json::to_value(CallToolParams {
            name: call.name.clone(),
            arguments: call.arguments,
        })
        .map_err(|e| PorterError::Protocol(e.to_string()))?;

        let request = self.transport.request("tools/call", params);
        let result = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                PorterError::HostUnavailable(format!(
                    "tool '{}' did not respond within {limit:?}",
                    call.name
                ))
            })??,
            None => request.await?,
        };

        let result: CallToolResult = serde_json::from_value(result)
            .map_err(|e| PorterError::Protocol(format!("malformed tools/call result: {e}")))?;

        if result.is_error {
            return Err(PorterError::ToolExecution(result.text()));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted transport that records every method sent over it.
    struct FakeTransport {
        responses: Mutex<Vec<PorterResult<Value>>>,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<PorterResult<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for std::sync::Arc<FakeTransport> {
        async fn request(&self, method: &str, params: Value) -> PorterResult<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.responses.lock().unwrap().remove(0)
        }

        async fn notify(&self, method: &str, params: Value) -> PorterResult<()> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            Ok(())
        }

        async fn close(&self) -> PorterResult<()> {
            Ok(())
        }
    }

    fn tools_listing() -> Value {
        json!({
            "tools": [
                {"name": "read_file", "description": "Read a file", "inputSchema": {"type": "object"}},
                {"name": "write_file", "description": "Write a file", "inputSchema": {"type": "object"}}
            ]
        })
    }

    #[tokio::test]
    async fn test_discover_maps_and_caches_tools() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![Ok(tools_listing())]));
        let client = McpClient::new(Box::new(transport.clone()));

        let tools = client.discover().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "read_file");
        assert_eq!(tools[0].description, "Read a file");
        assert_eq!(client.tools(), tools);
    }

    #[tokio::test]
    async fn test_discover_is_idempotent() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![
            Ok(tools_listing()),
            Ok(tools_listing()),
        ]));
        let client = McpClient::new(Box::new(transport.clone()));

        let first = client.discover().await.unwrap();
        let second = client.discover().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_discover_malformed_listing() {
        let transport =
            std::sync::Arc::new(FakeTransport::new(vec![Ok(json!({"unexpected": true}))]));
        let client = McpClient::new(Box::new(transport.clone()));

        let result = client.discover().await;
        assert!(matches!(result, Err(PorterError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_call_unknown_tool_never_reaches_host() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![Ok(tools_listing())]));
        let client = McpClient::new(Box::new(transport.clone()));
        client.discover().await.unwrap();

        let result = client
            .call(ToolCall::new("delete_everything", json!({})))
            .await;

        assert!(matches!(result, Err(PorterError::ToolNotFound(_))));
        let methods: Vec<String> = transport
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect();
        assert_eq!(methods, vec!["tools/list"]);
    }

    #[tokio::test]
    async fn test_call_success() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![
            Ok(tools_listing()),
            Ok(json!({"content": [{"type": "text", "text": "contents of X"}], "isError": false})),
        ]));
        let client = McpClient::new(Box::new(transport.clone()));
        client.discover().await.unwrap();

        let result = client
            .call(ToolCall::new("read_file", json!({"path": "X"})))
            .await
            .unwrap();
        assert_eq!(result.text(), "contents of X");

        let requests = transport.requests.lock().unwrap();
        let (method, params) = &requests[1];
        assert_eq!(method, "tools/call");
        assert_eq!(params["name"], "read_file");
        assert_eq!(params["arguments"]["path"], "X");
    }

    #[tokio::test]
    async fn test_call_tool_reported_failure() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![
            Ok(tools_listing()),
            Ok(json!({"content": [{"type": "text", "text": "no such path"}], "isError": true})),
        ]));
        let client = McpClient::new(Box::new(transport.clone()));
        client.discover().await.unwrap();

        let result = client
            .call(ToolCall::new("read_file", json!({"path": "missing"})))
            .await;
        assert_eq!(
            result,
            Err(PorterError::ToolExecution("no such path".to_string()))
        );
    }

    #[tokio::test]
    async fn test_call_transport_failure() {
        let transport = std::sync::Arc::new(FakeTransport::new(vec![
            Ok(tools_listing()),
            Err(PorterError::HostUnavailable("connection reset".to_string())),
        ]));
        let client = McpClient::new(Box::new(transport.clone()));
        client.discover().await.unwrap();

        let result = client.call(ToolCall::new("read_file", json!({}))).await;
        assert!(matches!(result, Err(PorterError::HostUnavailable(_))));
    }

    /// Transport whose requests never complete, for timeout coverage.
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn request(&self, method: &str, _params: Value) -> PorterResult<Value> {
            if method == "tools/list" {
                return Ok(tools_listing());
            }
            futures::future::pending().await
        }

        async fn notify(&self, _method: &str, _params: Value) -> PorterResult<()> {
            Ok(())
        }

        async fn close(&self) -> PorterResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_call_timeout_maps_to_host_unavailable() {
        let client = McpClient::new(Box::new(StalledTransport))
            .with_call_timeout(Duration::from_millis(10));
        client.discover().await.unwrap();

        let result = client.call(ToolCall::new("read_file", json!({}))).await;
        assert!(matches!(result, Err(PorterError::HostUnavailable(_))));
    }
}
