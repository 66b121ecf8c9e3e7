use std::{process::Stdio, sync::Arc};

use {
    async_trait::async_trait,
    notify_mcp_channels::ChannelSender,
    notify_mcp_config::{Method, MethodType},
    tracing::debug,
};

use crate::{
    command::{NotifyCommand, Platform},
    error::{Error, Result},
    icon::{BundledIcon, IconSource},
};

/// Title of every desktop notification.
pub const NOTIFICATION_TITLE: &str = "AI通知助手";

/// Shows the message as a native notification on the local machine.
#[derive(Clone)]
pub struct DesktopSender {
    platform: Option<Platform>,
    icon: Arc<dyn IconSource>,
}

impl Default for DesktopSender {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopSender {
    pub fn new() -> Self {
        Self::with_icon(Arc::new(BundledIcon::default()))
    }

    pub fn with_icon(icon: Arc<dyn IconSource>) -> Self {
        Self {
            platform: Platform::current(),
            icon,
        }
    }

    /// The command that would be run for `body`, or an error on platforms
    /// without a supported notifier.
    ///
    /// Blocking: may write the icon file and search `PATH`.
    pub fn command(&self, body: &str) -> Result<NotifyCommand> {
        let platform = self.platform.ok_or(Error::UnsupportedPlatform {
            os: std::env::consts::OS,
        })?;
        let icon = self.icon.icon_path();
        Ok(NotifyCommand::for_platform(
            platform,
            NOTIFICATION_TITLE,
            body,
            icon.as_deref(),
        ))
    }

    pub async fn show(&self, body: &str) -> Result<()> {
        let sender = self.clone();
        let owned = body.to_owned();
        let notify = tokio::task::spawn_blocking(move || sender.command(&owned)).await??;
        let program = notify.program.display().to_string();
        debug!(%program, "showing desktop notification");

        let output = notify
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for DesktopSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopSender")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChannelSender for DesktopSender {
    fn method_type(&self) -> MethodType {
        MethodType::Os
    }

    async fn send(&self, method: &Method, message: &str) -> anyhow::Result<()> {
        if method.method_type() != MethodType::Os {
            anyhow::bail!("notification method is {}, not os", method.method_type());
        }
        self.show(message).await?;
        Ok(())
    }
}
