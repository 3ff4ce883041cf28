mod config;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use porter::agent::Agent;
use porter::host::ToolHost;
use porter::mcp::client::McpClient;
use porter::mcp::transport::SseTransport;
use porter::providers::anthropic::AnthropicProvider;

use crate::session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SSE endpoint of the tool host to connect to
    #[arg(default_value = "http://localhost:3000/sse")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Configuration problems are fatal before any connection is attempted.
    config::validate_host_env()?;
    let provider = AnthropicProvider::from_env().context("model provider configuration")?;

    let transport = SseTransport::connect(&cli.server)
        .await
        .with_context(|| format!("failed to connect to the tool host at {}", cli.server))?;
    let client = Arc::new(McpClient::new(Box::new(transport)));
    client.initialize().await.context("MCP handshake failed")?;
    let tools = client.discover().await.context("tool discovery failed")?;

    let names: Vec<&str> = tools.iter().map(|tool| tool.name.as_str()).collect();
    println!(
        "{}",
        style(format!("Connected to server with tools: {names:?}")).dim()
    );

    let agent = Agent::new(Box::new(provider), client.clone());
    let session = Session::new(agent, tools);
    let result = session.start().await;

    if let Err(e) = client.close().await {
        warn!(error = %e, "failed to close the tool host connection");
    }
    result
}
