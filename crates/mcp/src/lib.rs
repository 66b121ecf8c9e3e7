//! MCP (Model Context Protocol) server for notify-mcp.
//!
//! This crate provides:
//! - JSON-RPC 2.0 and MCP message types (`types`)
//! - Request routing for `initialize`, `ping`, `tools/list`, `tools/call` (`server`)
//! - Newline-delimited JSON over stdio with per-request cancellation (`transport`)
//! - The `notify` tool backed by the channel dispatcher (`notify_tool`)

pub mod error;
pub mod notify_tool;
pub mod server;
pub mod traits;
pub mod transport;
pub mod types;

pub use {
    error::{Error, Result},
    notify_tool::NotifyTool,
    server::McpServer,
    traits::McpTool,
    transport::{serve, serve_stdio},
};
