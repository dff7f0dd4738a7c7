//! HTTP Handlers
//!
//! MCP streamable-HTTP endpoint: one JSON-RPC message per `POST /mcp`,
//! answered with a single JSON body.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use agent_core::{
    AgentError, ToolBackend, ToolCall,
    protocol::{
        CallToolParams, CallToolResult, Content, Implementation, InitializeResult, JsonRpcRequest,
        JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, SESSION_HEADER, codes,
    },
};

use crate::state::AppState;

pub const SERVER_NAME: &str = "crypto-briefing";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub channel_connected: bool,
    pub market_data_configured: bool,
    pub tools: Vec<String>,
}

/// JSON-RPC error raised while dispatching
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        channel_connected: state.channel.is_connected(),
        market_data_configured: state.market_data_configured,
        tools: state.tools.names().into_iter().map(String::from).collect(),
    })
}

/// `POST /mcp`
pub async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable JSON-RPC body");
            return rpc_reply(
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(Value::Null, codes::PARSE_ERROR, format!("Parse error: {}", e)),
            );
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return rpc_reply(
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(Value::Null, codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
            );
        }
    };

    if let Some(session) = session_id(&headers) {
        if !state.has_session(session).await {
            return (StatusCode::NOT_FOUND, "Unknown MCP session").into_response();
        }
    }

    if request.is_notification() {
        tracing::debug!(method = %request.method, "Notification received");
        return StatusCode::ACCEPTED.into_response();
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    if request.method == "initialize" {
        let session = state.open_session().await;
        tracing::info!(session = %session, "MCP session opened");

        let mut response = rpc_reply(StatusCode::OK, JsonRpcResponse::result(id, initialize_result()));
        if let Ok(value) = HeaderValue::from_str(&session) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
        return response;
    }

    let reply = match dispatch(&state, &request).await {
        Ok(result) => JsonRpcResponse::result(id, result),
        Err(e) => JsonRpcResponse::error(id, e.code, e.message),
    };
    rpc_reply(StatusCode::OK, reply)
}

/// `GET /mcp`; no server-initiated stream is offered
pub async fn mcp_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        "Server-initiated streams are not supported",
    )
        .into_response()
}

/// `DELETE /mcp`, ending the session
pub async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(session) = session_id(&headers) {
        if state.close_session(session).await {
            tracing::info!(session = %session, "MCP session closed");
        }
    }
    StatusCode::OK
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn rpc_reply(status: StatusCode, reply: JsonRpcResponse) -> Response {
    (status, Json(reply)).into_response()
}

fn initialize_result() -> Value {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.into(),
        capabilities: json!({"tools": {"listChanged": false}}),
        server_info: Implementation {
            name: SERVER_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
        },
        instructions: Some(crypto_briefing::SERVER_INSTRUCTIONS.into()),
    };
    serde_json::to_value(result).unwrap_or_else(|_| json!({}))
}

async fn dispatch(state: &AppState, request: &JsonRpcRequest) -> Result<Value, RpcError> {
    match request.method.as_str() {
        "ping" => Ok(json!({})),
        "tools/list" => {
            let tools = state
                .tools
                .list_tools()
                .await
                .map_err(|e| RpcError::new(codes::INTERNAL_ERROR, e.to_string()))?;
            to_value(&ListToolsResult { tools })
        }
        "tools/call" => {
            let params: CallToolParams = request
                .params
                .clone()
                .ok_or_else(|| RpcError::new(codes::INVALID_PARAMS, "Missing params"))
                .and_then(|p| {
                    serde_json::from_value(p)
                        .map_err(|e| RpcError::new(codes::INVALID_PARAMS, format!("Invalid params: {}", e)))
                })?;
            to_value(&call_tool(state, params, request.id.as_ref()).await?)
        }
        other => Err(RpcError::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

async fn call_tool(state: &AppState, params: CallToolParams, id: Option<&Value>) -> Result<CallToolResult, RpcError> {
    let call = ToolCall {
        name: params.name,
        arguments: params.arguments.unwrap_or_default().into_iter().collect::<HashMap<_, _>>(),
        id: id.map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    };
    tracing::info!(tool = %call.name, args = ?call.arguments, "Tool call");

    match state.tools.call_tool(&call).await {
        Ok(result) => Ok(CallToolResult {
            content: vec![Content::text(result.output)],
            is_error: !result.success,
        }),
        Err(AgentError::ToolNotFound(name)) => Err(RpcError::new(
            codes::INVALID_PARAMS,
            format!("Unknown tool: {}", name),
        )),
        Err(e) => Err(RpcError::new(codes::INTERNAL_ERROR, e.to_string())),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(codes::INTERNAL_ERROR, e.to_string()))
}
