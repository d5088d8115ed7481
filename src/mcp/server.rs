//! MCP request dispatch, independent of the transport.
//!
//! Stateless: every message is handled on its own, so `tools/list` and
//! `tools/call` work without a prior `initialize`, which is what the HTTP
//! transport needs with sessions disabled.

use std::sync::Arc;

use serde_json::Value;

use crate::mcp::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult,
    SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ToolDescriptor, ToolsCapability, error_codes,
};
use crate::tools::{ToolError, ToolRegistry};

pub const SERVER_NAME: &str = "nuclei-mcp";

/// Dispatches JSON-RPC messages to the tool registry.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw message. Returns `None` when no response is due
    /// (notifications and stray client responses).
    pub async fn handle_bytes(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };
        self.handle_value(value).await
    }

    /// Handle one decoded message.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        // Responses to server-initiated requests; we never send any.
        if value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some())
        {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }

        self.handle_request(request).await
    }

    /// Handle a well-formed request or notification.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification received");
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        let params = request.params.unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(params).await,
            other => Err((
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    fn initialize(&self, params: Value) -> Result<Value, (i64, String)> {
        let params: InitializeParams = if params.is_null() {
            InitializeParams::default()
        } else {
            serde_json::from_value(params)
                .map_err(|e| (error_codes::INVALID_PARAMS, format!("Invalid params: {}", e)))?
        };

        let protocol_version = params
            .protocol_version
            .as_deref()
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(LATEST_PROTOCOL_VERSION)
            .to_string();

        tracing::info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            requested = params.protocol_version.as_deref().unwrap_or("-"),
            negotiated = %protocol_version,
            "client initialized"
        );

        to_value(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    fn list_tools(&self) -> Result<Value, (i64, String)> {
        to_value(ListToolsResult {
            tools: self
                .registry
                .schemas()
                .into_iter()
                .map(ToolDescriptor::from)
                .collect(),
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| (error_codes::INVALID_PARAMS, format!("Invalid params: {}", e)))?;
        let arguments = params
            .arguments
            .unwrap_or_else(|| Value::Object(Default::default()));

        let result = match self.registry.execute(&params.name, arguments).await {
            Ok(output) => CallToolResult::text(output.text),
            Err(e @ (ToolError::NotFound(_) | ToolError::InvalidParameters(_))) => {
                return Err((error_codes::INVALID_PARAMS, e.to_string()));
            }
            Err(e) => CallToolResult::error(e.to_string()),
        };

        to_value(result)
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, (i64, String)> {
    serde_json::to_value(value).map_err(|e| (error_codes::INTERNAL_ERROR, e.to_string()))
}
