use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::PorterResult;
use crate::host::ToolHost;
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;
use crate::providers::base::Provider;

/// Agent pairs a chat model with a tool host and answers one query at a
/// time. It owns all session state explicitly; both collaborators are trait
/// objects, so tests run against fakes.
pub struct Agent {
    provider: Box<dyn Provider>,
    host: Arc<dyn ToolHost>,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, host: Arc<dyn ToolHost>) -> Self {
        Self { provider, host }
    }

    /// Answer a single user query.
    ///
    /// The first model call carries the tool declarations. Each tool-use
    /// block in that response is annotated in the output, dispatched to the
    /// host, its result folded into history as a user message, and answered
    /// by one follow-up completion made without declarations. Follow-up
    /// responses are not themselves scanned for tool use: the model gets
    /// one round of tools per query.
    ///
    /// History lives only for the duration of this call. Any provider or
    /// host failure aborts the whole query; there are no retries and no
    /// partial answers.
    pub async fn answer(&self, query: &str, tools: &[Tool]) -> PorterResult<String> {
        let mut messages = vec![Message::user().with_text(query)];
        let mut fragments: Vec<String> = Vec::new();

        let (response, _usage) = self.provider.complete(&messages, tools).await?;
        debug!(blocks = response.content.len(), "initial completion received");

        for content in &response.content {
            match content {
                MessageContent::Text(text) => fragments.push(text.clone()),
                MessageContent::ToolRequest(request) => {
                    let call = request.tool_call.clone()?;
                    fragments.push(format!(
                        "[Calling tool {} with args {}]",
                        call.name, call.arguments
                    ));

                    info!(tool = %call.name, "dispatching tool call");
                    let result = self.host.call(call).await?;

                    messages.push(Message::user().with_text(result.text()));

                    let (follow_up, _) = self.provider.complete(&messages, &[]).await?;
                    fragments.push(
                        follow_up
                            .content
                            .first()
                            .and_then(|block| block.as_text())
                            .unwrap_or_default()
                            .to_string(),
                    );
                }
                // Model responses never carry tool results.
                MessageContent::ToolResponse(_) => {}
            }
        }

        Ok(fragments.join("\n"))
    }
}
