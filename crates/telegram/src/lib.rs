//! Telegram delivery channel.
//!
//! Posts plain-text messages to `{apiBaseUrl}/bot{token}/sendMessage` of the
//! Bot API (or a compatible self-hosted endpoint).

pub mod error;
pub mod sender;

pub use {
    error::{Error, Result},
    sender::{SEND_TIMEOUT, TelegramSender},
};
