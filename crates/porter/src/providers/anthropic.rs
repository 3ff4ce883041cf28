use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::base::{Provider, Usage};
use super::configs::{AnthropicConfig, ProviderConfig};
use crate::errors::{PorterError, PorterResult};
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> PorterResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| PorterError::ModelApi(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> PorterResult<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    /// Convert internal messages to the Messages API spec. Every content
    /// block variant has a wire form, including failed tool traffic, which
    /// is rendered so the model can read the error.
    fn messages_to_spec(messages: &[Message]) -> Vec<Value> {
        let mut spec = Vec::new();

        for message in messages {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };

            let mut blocks = Vec::new();
            for content in &message.content {
                match content {
                    MessageContent::Text(text) => {
                        blocks.push(json!({"type": "text", "text": text}));
                    }
                    MessageContent::ToolRequest(request) => match &request.tool_call {
                        Ok(call) => blocks.push(json!({
                            "type": "tool_use",
                            "id": request.id,
                            "name": call.name,
                            "input": call.arguments,
                        })),
                        Err(e) => blocks.push(json!({
                            "type": "text",
                            "text": format!("Error: {}", e),
                        })),
                    },
                    MessageContent::ToolResponse(response) => match &response.tool_result {
                        Ok(text) => blocks.push(json!({
                            "type": "tool_result",
                            "tool_use_id": response.id,
                            "content": text,
                        })),
                        Err(e) => blocks.push(json!({
                            "type": "tool_result",
                            "tool_use_id": response.id,
                            "content": format!("The tool call returned the following error:\n{}", e),
                            "is_error": true,
                        })),
                    },
                }
            }

            spec.push(json!({"role": role, "content": blocks}));
        }

        spec
    }

    fn tools_to_spec(tools: &[Tool]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.input_schema,
                })
            })
            .collect()
    }

    /// Convert an API response body into an assistant message.
    fn response_to_message(response: &Value) -> PorterResult<Message> {
        let blocks = response
            .get("content")
            .and_then(|content| content.as_array())
            .ok_or_else(|| {
                PorterError::Protocol("response is missing the content array".to_string())
            })?;

        let mut message = Message::assistant();
        for block in blocks {
            match block.get("type").and_then(|kind| kind.as_str()) {
                Some("text") => {
                    let text = block.get("text").and_then(|text| text.as_str()).ok_or_else(
                        || PorterError::Protocol("text block without text".to_string()),
                    )?;
                    message = message.with_text(text);
                }
                Some("tool_use") => {
                    let id = block
                        .get("id")
                        .and_then(|id| id.as_str())
                        .ok_or_else(|| {
                            PorterError::Protocol("tool_use block without id".to_string())
                        })?;
                    let name = block
                        .get("name")
                        .and_then(|name| name.as_str())
                        .ok_or_else(|| {
                            PorterError::Protocol("tool_use block without name".to_string())
                        })?;
                    let input = block.get("input").cloned().unwrap_or(Value::Null);
                    message = message.with_tool_request(id, Ok(ToolCall::new(name, input)));
                }
                other => {
                    return Err(PorterError::Protocol(format!(
                        "unexpected content block type: {other:?}"
                    )))
                }
            }
        }

        Ok(message)
    }

    fn get_usage(response: &Value) -> Usage {
        let usage = response.get("usage");
        let input_tokens = usage
            .and_then(|u| u.get("input_tokens"))
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let output_tokens = usage
            .and_then(|u| u.get("output_tokens"))
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        };
        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> PorterResult<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PorterError::ModelApi(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| PorterError::Protocol(format!("unparseable response body: {e}"))),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(PorterError::ModelApi(format!("server error: {status}")))
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(PorterError::ModelApi(format!(
                    "request failed: {status} - {error_text}"
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> PorterResult<(Message, Usage)> {
        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": Self::messages_to_spec(messages),
        });

        if !tools.is_empty() {
            payload
                .as_object_mut()
                .unwrap()
                .insert("tools".to_string(), json!(Self::tools_to_spec(tools)));
        }

        let response = self.post(payload).await?;
        let message = Self::response_to_message(&response)?;
        let usage = Self::get_usage(&response);
        debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "completion received"
        );

        Ok((message, usage))
    }
}
