use std::time::Duration;

use notify_mcp_config::MethodType;

/// Crate-wide result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] notify_mcp_config::Error),

    /// Settings loaded but list no methods.
    #[error("no notification methods configured")]
    NoMethods,

    #[error("no sender registered for method type {method}")]
    NoSender { method: MethodType },

    #[error("{method} send timed out after {}s", timeout.as_secs())]
    Timeout {
        method: MethodType,
        timeout: Duration,
    },

    #[error("dispatch cancelled")]
    Cancelled,

    /// The channel's sender returned an error.
    #[error("{method} send failed: {reason}")]
    Send { method: MethodType, reason: String },
}
