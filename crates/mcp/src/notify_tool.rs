//! The `notify` tool: send the composed notification to every configured channel.

use {
    async_trait::async_trait,
    notify_mcp_channels::{DEFAULT_TASK_LABEL, Error as DispatchError, Notifier},
    serde_json::{Value, json},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    error::Result,
    traits::McpTool,
    types::{McpToolDef, ToolAnnotations, ToolsCallResult},
};

pub const TOOL_NAME: &str = "notify";
pub const TASK_NAME_PARAM: &str = "taskName";

const TOOL_DESCRIPTION: &str = "向已配置的渠道发送通知";
const TASK_NAME_DESCRIPTION: &str = "当前执行任务的缩略标题";
const LOAD_FAILED: &str = "读取通知配置失败";
const NO_METHODS: &str = "未配置任何通知方式";

pub struct NotifyTool {
    notifier: Notifier,
}

impl NotifyTool {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

/// Missing or non-string `taskName` falls back to the default label.
fn task_name(arguments: &Value) -> &str {
    arguments
        .get(TASK_NAME_PARAM)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TASK_LABEL)
}

#[async_trait]
impl McpTool for NotifyTool {
    fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: TOOL_NAME.into(),
            description: Some(TOOL_DESCRIPTION.into()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "taskName": {
                        "type": "string",
                        "description": TASK_NAME_DESCRIPTION,
                        "default": DEFAULT_TASK_LABEL,
                    }
                }
            }),
            annotations: Some(ToolAnnotations {
                title: Some(TOOL_NAME.into()),
                destructive_hint: Some(false),
            }),
        }
    }

    async fn call(&self, arguments: Value, cancel: CancellationToken) -> Result<ToolsCallResult> {
        let task = task_name(&arguments);
        let outcome = match self.notifier.notify(task, &cancel).await {
            Ok(outcome) => outcome,
            Err(DispatchError::NoMethods) => return Ok(ToolsCallResult::error(NO_METHODS)),
            Err(e) => {
                warn!(error = %e, "notify could not load settings");
                return Ok(ToolsCallResult::error(LOAD_FAILED));
            },
        };

        let summary = outcome.summary();
        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "notify finished"
        );
        if outcome.is_success() {
            Ok(ToolsCallResult::text(summary))
        } else {
            Ok(ToolsCallResult::error(summary))
        }
    }
}
