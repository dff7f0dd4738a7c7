//! MCP Client
//!
//! Streamable-HTTP client for a remote tool server. Every JSON-RPC message
//! is a `POST` to one endpoint; the server answers either with a plain JSON
//! body or with a short `text/event-stream` carrying the response.

use std::sync::atomic::{AtomicU64, Ordering};

use agent_core::{
    error::{AgentError, Result},
    protocol::{
        CallToolResult, Implementation, InitializeParams, InitializeResult, JsonRpcRequest,
        JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, SESSION_HEADER, ToolDescriptor,
    },
    tool::{ToolBackend, ToolCall, ToolResult},
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tokio::sync::RwLock;

/// Remote tool server connection
pub struct McpClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: RwLock<Option<String>>,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            session_id: RwLock::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// Client for the server's `/mcp` endpoint at `host:port`
    pub fn for_host(host: &str, port: u16) -> Result<Self> {
        Self::new(format!("http://{}:{}/mcp", host, port))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform the initialize handshake
    pub async fn connect(&self) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.into(),
            capabilities: json!({}),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
        };

        let result = self.request("initialize", Some(serde_json::to_value(params)?)).await?;
        let init: InitializeResult = serde_json::from_value(result)?;

        self.notify("notifications/initialized").await?;

        tracing::info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            protocol = %init.protocol_version,
            "Connected to tool server"
        );
        Ok(init)
    }

    /// End the server-side session. Best effort.
    pub async fn close(&self) {
        let Some(session) = self.session_id.write().await.take() else {
            return;
        };
        if let Err(e) = self
            .http
            .delete(&self.endpoint)
            .header(SESSION_HEADER, &session)
            .send()
            .await
        {
            tracing::debug!(error = %e, "Session close failed");
        }
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(message);
        if let Some(session) = self.session_id.read().await.as_deref() {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        if let Some(session) = response.headers().get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
            *self.session_id.write().await = Some(session.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Transport(format!("HTTP {}: {}", status, body)));
        }
        Ok(response)
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = JsonRpcRequest::new(id, method, params);

        let response = self.post(&message).await?;
        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let reply = if is_stream {
            find_sse_response(&body, &json!(id))?
        } else {
            serde_json::from_str::<JsonRpcResponse>(&body)?
        };

        if let Some(error) = reply.error {
            return Err(AgentError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        reply
            .result
            .ok_or_else(|| AgentError::Parse(format!("'{}' response has neither result nor error", method)))
    }

    async fn notify(&self, method: &str) -> Result<()> {
        self.post(&JsonRpcRequest::notification(method)).await.map(|_| ())
    }
}

/// `data:` payloads of a server-sent event stream, one per event
fn sse_data(body: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                events.push(current.join("\n"));
                current.clear();
            }
        } else if let Some(data) = line.strip_prefix("data:") {
            current.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }
    if !current.is_empty() {
        events.push(current.join("\n"));
    }
    events
}

fn find_sse_response(body: &str, id: &Value) -> Result<JsonRpcResponse> {
    sse_data(body)
        .iter()
        .filter_map(|data| serde_json::from_str::<JsonRpcResponse>(data).ok())
        .find(|r| &r.id == id)
        .ok_or_else(|| AgentError::Parse("event stream ended without a response".into()))
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.request("tools/list", None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult> {
        let params = json!({
            "name": call.name,
            "arguments": call.arguments,
        });
        let result = self.request("tools/call", Some(params)).await?;
        let result: CallToolResult = serde_json::from_value(result)?;

        let output = result.first_text().to_string();
        let tool_result = if result.is_error {
            ToolResult::failure(&call.name, output)
        } else {
            ToolResult::success(&call.name, output)
        };
        Ok(match &call.id {
            Some(id) => tool_result.with_id(id),
            None => tool_result,
        })
    }
}
