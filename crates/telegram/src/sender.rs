use std::time::Duration;

use {
    async_trait::async_trait,
    notify_mcp_channels::ChannelSender,
    notify_mcp_config::{Method, MethodType, TelegramConfig},
    secrecy::ExposeSecret,
    serde::Serialize,
    tracing::debug,
};

use crate::error::{Error, Result};

/// HTTP timeout for one `sendMessage` call.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Sends notifications through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramSender {
    client: reqwest::Client,
}

impl TelegramSender {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST `text` to the configured chat. Any status >= 300 is an error.
    pub async fn send_message(&self, config: &TelegramConfig, text: &str) -> Result<()> {
        let url = send_message_url(&config.api_base_url, config.token.expose_secret());
        let payload = SendMessage {
            chat_id: &config.chat_id,
            text,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }

        debug!(chat_id = %config.chat_id, %status, "telegram message accepted");
        Ok(())
    }
}

fn send_message_url(api_base_url: &str, token: &str) -> String {
    format!("{}/bot{token}/sendMessage", api_base_url.trim_end_matches('/'))
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn method_type(&self) -> MethodType {
        MethodType::Telegram
    }

    fn timeout(&self) -> Duration {
        SEND_TIMEOUT
    }

    async fn send(&self, method: &Method, message: &str) -> anyhow::Result<()> {
        let config = method.as_telegram().ok_or_else(|| {
            Error::message(format!(
                "notification method is {}, not telegram",
                method.method_type()
            ))
        })?;
        self.send_message(config, message).await?;
        Ok(())
    }
}
