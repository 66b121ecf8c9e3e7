//! Seam between the protocol layer and the tools it exposes.

use {async_trait::async_trait, serde_json::Value, tokio_util::sync::CancellationToken};

use crate::{
    error::Result,
    types::{McpToolDef, ToolsCallResult},
};

/// A tool served over MCP.
///
/// Tool-level failures the caller should see belong in
/// [`ToolsCallResult::error`]; an `Err` is reported as a JSON-RPC internal
/// error instead.
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Definition advertised by `tools/list`.
    fn definition(&self) -> McpToolDef;

    /// Run the tool. `cancel` fires when the client cancels the request.
    async fn call(&self, arguments: Value, cancel: CancellationToken) -> Result<ToolsCallResult>;
}
