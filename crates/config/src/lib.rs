//! Notification settings: schema, legacy migration, validation and persistence.
//!
//! Settings live in a single JSON document at
//! `<user-config-dir>/notify-mcp/config.json`. Documents written by the
//! single-channel releases (flat `apiBaseUrl`/`chatId`/`token`) are upgraded
//! in memory on read; the file itself is only rewritten on the next save.

pub mod error;
pub mod loader;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{ConfigStore, clear_config_dir, config_dir, set_config_dir},
    schema::{
        DEFAULT_NOTIFICATION_MESSAGE, DEFAULT_TELEGRAM_API_BASE_URL, Method, MethodType, Settings,
        TelegramConfig,
    },
};
