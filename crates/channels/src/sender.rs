use std::time::Duration;

use {
    anyhow::Result,
    async_trait::async_trait,
    notify_mcp_config::{Method, MethodType},
};

/// Upper bound for a single channel send unless the sender says otherwise.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivery capability for one kind of channel.
///
/// Implementations receive the whole [`Method`] and pick out their own
/// payload; a method of another type is an error, not a panic.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// The method type this sender handles.
    fn method_type(&self) -> MethodType;

    /// Deadline applied by the dispatcher around [`ChannelSender::send`].
    fn timeout(&self) -> Duration {
        DEFAULT_SEND_TIMEOUT
    }

    /// Deliver `message` once.
    async fn send(&self, method: &Method, message: &str) -> Result<()>;
}
