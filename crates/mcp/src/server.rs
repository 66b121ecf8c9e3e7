//! Request routing for the MCP methods this server understands.

use std::sync::Arc;

use {
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    traits::McpTool,
    types::{
        INTERNAL_ERROR, INVALID_PARAMS, InitializeParams, InitializeResult, JsonRpcError,
        JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PROTOCOL_VERSION, ServerCapabilities,
        ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult,
    },
};

pub const SERVER_NAME: &str = "notify-mcp";

/// Routes JSON-RPC requests to handlers. Tools are listed in registration order.
#[derive(Clone)]
pub struct McpServer {
    info: ServerInfo,
    tools: Vec<Arc<dyn McpTool>>,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServer {
    pub fn new() -> Self {
        Self {
            info: ServerInfo {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            tools: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn McpTool>) -> Self {
        self.tools.push(tool);
        self
    }

    fn tool(&self, name: &str) -> Option<&Arc<dyn McpTool>> {
        self.tools.iter().find(|t| t.definition().name == name)
    }

    /// Handle one request. Never fails: errors become JSON-RPC error responses.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationToken,
    ) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!(%method, %id, "client -> server");

        let result = match method.as_str() {
            "initialize" => self.initialize(params),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(params, cancel).await,
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {method}"),
            )),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                warn!(%method, code = error.code, error = %error.message, "request failed");
                JsonRpcResponse::failure(id, error)
            },
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        info!(
            client = params
                .client_info
                .as_ref()
                .map_or("unknown", |c| c.name.as_str()),
            requested_version = params.protocol_version.as_deref().unwrap_or(""),
            "MCP client connected"
        );
        to_value(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.into(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
                logging: None,
            },
            server_info: self.info.clone(),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_value(&ToolsListResult {
            tools: self.tools.iter().map(|t| t.definition()).collect(),
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        cancel: CancellationToken,
    ) -> Result<Value, JsonRpcError> {
        let params: ToolsCallParams = parse_params(params)?;
        let tool = self.tool(&params.name).ok_or_else(|| {
            JsonRpcError::new(INVALID_PARAMS, format!("unknown tool: {}", params.name))
        })?;

        let result = tool
            .call(params.arguments, cancel)
            .await
            .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
        debug!(tool = %params.name, is_error = result.is_error, "tool call finished");
        to_value(&result)
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("info", &self.info)
            .field("tools", &self.tools.len())
            .finish()
    }
}

/// Absent or null params are read as an empty object.
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let value = match params {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value,
    };
    serde_json::from_value(value)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {e}")))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use {async_trait::async_trait, serde_json::json};

    use super::*;
    use crate::types::{McpToolDef, ToolsCallResult};

    /// Echoes `text` back; waits for cancellation when `text` is "block".
    pub(crate) struct EchoTool;

    #[async_trait]
    impl McpTool for EchoTool {
        fn definition(&self) -> McpToolDef {
            McpToolDef {
                name: "echo".into(),
                description: Some("echo text".into()),
                input_schema: json!({"type": "object"}),
                annotations: None,
            }
        }

        async fn call(
            &self,
            arguments: Value,
            cancel: CancellationToken,
        ) -> crate::Result<ToolsCallResult> {
            match arguments["text"].as_str() {
                Some("block") => {
                    cancel.cancelled().await;
                    Ok(ToolsCallResult::error("cancelled"))
                },
                Some("fail") => Err(crate::Error::message("tool exploded")),
                Some(text) => Ok(ToolsCallResult::text(text)),
                None => Ok(ToolsCallResult::error("missing text")),
            }
        }
    }

    pub(crate) fn server() -> McpServer {
        McpServer::new().with_tool(Arc::new(EchoTool))
    }

    async fn call(method: &str, params: Option<Value>) -> JsonRpcResponse {
        server()
            .handle(
                JsonRpcRequest {
                    jsonrpc: "2.0".into(),
                    id: json!(1),
                    method: method.into(),
                    params,
                },
                CancellationToken::new(),
            )
            .await
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_tools() {
        let resp = call(
            "initialize",
            Some(json!({"protocolVersion": "2025-03-26", "capabilities": {}})),
        )
        .await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "notify-mcp");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let resp = call("ping", None).await;
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn lists_registered_tools() {
        let resp = call("tools/list", None).await;
        let result = resp.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "echo");
        assert_eq!(result["tools"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn calls_tool() {
        let resp = call(
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"text": "hi"}})),
        )
        .await;
        let result = resp.result.unwrap();
        assert_eq!(result["content"][0]["text"], "hi");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let resp = call("resources/list", None).await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let resp = call("tools/call", Some(json!({"name": "nope"}))).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert!(error.message.contains("nope"));
    }

    #[tokio::test]
    async fn malformed_call_params_are_invalid() {
        let resp = call("tools/call", Some(json!({"arguments": {}}))).await;
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn tool_error_is_internal_error() {
        let resp = call(
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"text": "fail"}})),
        )
        .await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(error.message, "tool exploded");
    }
}
