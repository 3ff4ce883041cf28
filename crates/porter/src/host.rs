use async_trait::async_trait;

use crate::errors::PorterResult;
use crate::mcp::protocol::CallToolResult;
use crate::models::tool::{Tool, ToolCall};

/// A source of invocable tools. The agent only ever sees this trait; the
/// production implementation is [`McpClient`](crate::mcp::client::McpClient).
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Declarations from the most recent discovery.
    fn tools(&self) -> Vec<Tool>;

    /// Refresh the declaration set from the host.
    async fn discover(&self) -> PorterResult<Vec<Tool>>;

    /// Run one tool on the host and await its result. Execution time is
    /// host-controlled; callers wanting bounded latency configure a timeout
    /// on the implementation.
    async fn call(&self, call: ToolCall) -> PorterResult<CallToolResult>;
}
