use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{PorterError, PorterResult};
use crate::mcp::protocol::{JsonRpcResponse, JSONRPC_VERSION};

/// How long to wait for the server to announce its message endpoint.
const ENDPOINT_WAIT: Duration = Duration::from_secs(30);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Request/response channel to a tool host. The registry adapter depends
/// only on this trait; the production implementation is [`SseTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and await the correlated response's `result` value.
    async fn request(&self, method: &str, params: Value) -> PorterResult<Value>;

    /// Send a notification; no response is expected.
    async fn notify(&self, method: &str, params: Value) -> PorterResult<()>;

    /// Tear down the connection.
    async fn close(&self) -> PorterResult<()>;
}

/// MCP's SSE transport: a long-lived event stream carries responses from the
/// host, and requests are POSTed to an endpoint the server announces as its
/// first event on that stream.
pub struct SseTransport {
    http: Client,
    endpoint: Url,
    pending: PendingMap,
    next_id: AtomicU64,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl SseTransport {
    /// Open the event stream and wait for the server's `endpoint` event.
    pub async fn connect(sse_url: &str) -> PorterResult<Self> {
        let base = Url::parse(sse_url)
            .map_err(|e| PorterError::Config(format!("invalid server URL '{sse_url}': {e}")))?;
        let mut events = EventSource::get(base.clone());

        let endpoint =
            tokio::time::timeout(ENDPOINT_WAIT, Self::await_endpoint(&base, &mut events))
                .await
                .map_err(|_| {
                    PorterError::HostUnavailable(
                        "timed out waiting for the server's endpoint event".to_string(),
                    )
                })??;
        debug!(%endpoint, "tool host announced its message endpoint");

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(Self::read_events(events, Arc::clone(&pending)));

        Ok(Self {
            http: Client::new(),
            endpoint,
            pending,
            next_id: AtomicU64::new(1),
            reader: Mutex::new(Some(reader)),
        })
    }

    async fn await_endpoint(base: &Url, events: &mut EventSource) -> PorterResult<Url> {
        while let Some(event) = events.next().await {
            match event {
                Ok(Event::Open) => continue,
                Ok(Event::Message(message)) if message.event == "endpoint" => {
                    return resolve_endpoint(base, message.data.trim());
                }
                Ok(Event::Message(message)) => {
                    debug!(event = %message.event, "ignoring event before endpoint");
                }
                Err(e) => {
                    return Err(PorterError::HostUnavailable(format!(
                        "tool host connection failed: {e}"
                    )))
                }
            }
        }
        Err(PorterError::HostUnavailable(
            "tool host closed the stream before announcing an endpoint".to_string(),
        ))
    }

    async fn read_events(mut events: EventSource, pending: PendingMap) {
        while let Some(event) = events.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) if message.event == "message" => {
                    if let Err(e) = dispatch_frame(&pending, &message.data) {
                        warn!(error = %e, "dropping malformed frame from tool host");
                    }
                }
                Ok(Event::Message(message)) => {
                    debug!(event = %message.event, "ignoring unrecognized event");
                }
                Err(e) => {
                    warn!(error = %e, "tool host stream ended");
                    break;
                }
            }
        }
        // Dropping the senders wakes every in-flight request with an error.
        pending.lock().unwrap().clear();
    }

    async fn post(&self, envelope: &Value) -> PorterResult<()> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(envelope)
            .send()
            .await
            .map_err(|e| PorterError::HostUnavailable(format!("failed to reach the tool host: {e}")))?;

        if !response.status().is_success() {
            return Err(PorterError::HostUnavailable(format!(
                "tool host rejected the request: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn request(&self, method: &str, params: Value) -> PorterResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, sender);

        let mut envelope = json!({"jsonrpc": JSONRPC_VERSION, "id": id, "method": method});
        if !params.is_null() {
            envelope
                .as_object_mut()
                .unwrap()
                .insert("params".to_string(), params);
        }

        if let Err(e) = self.post(&envelope).await {
            self.pending.lock().unwrap().remove(&id);
            return Err(e);
        }

        let response = receiver.await.map_err(|_| {
            PorterError::HostUnavailable(
                "connection to the tool host dropped before a response arrived".to_string(),
            )
        })?;

        if let Some(error) = response.error {
            return Err(PorterError::Protocol(format!(
                "tool host returned error {}: {}",
                error.code, error.message
            )));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn notify(&self, method: &str, params: Value) -> PorterResult<()> {
        let mut envelope = json!({"jsonrpc": JSONRPC_VERSION, "method": method});
        if !params.is_null() {
            envelope
                .as_object_mut()
                .unwrap()
                .insert("params".to_string(), params);
        }
        self.post(&envelope).await
    }

    async fn close(&self) -> PorterResult<()> {
        if let Some(reader) = self.reader.lock().unwrap().take() {
            reader.abort();
        }
        self.pending.lock().unwrap().clear();
        Ok(())
    }
}

/// Route one `message` event to the request waiting on its id.
fn dispatch_frame(
    pending: &Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>,
    data: &str,
) -> PorterResult<()> {
    let response: JsonRpcResponse = serde_json::from_str(data)
        .map_err(|e| PorterError::Protocol(format!("unparseable message from tool host: {e}")))?;

    let Some(id) = response.id else {
        // Server notifications carry no id; nothing waits on them.
        return Ok(());
    };

    match pending.lock().unwrap().remove(&id) {
        Some(sender) => {
            // The requester may have given up (timeout); that is its call.
            let _ = sender.send(response);
            Ok(())
        }
        None => Err(PorterError::Protocol(format!(
            "response for unknown request id {id}"
        ))),
    }
}

/// The endpoint event usually carries a path like `/message?sessionId=...`,
/// resolved against the SSE URL; absolute URLs pass through unchanged.
fn resolve_endpoint(base: &Url, raw: &str) -> PorterResult<Url> {
    base.join(raw)
        .map_err(|e| PorterError::Protocol(format!("invalid endpoint '{raw}': {e}")))
}
