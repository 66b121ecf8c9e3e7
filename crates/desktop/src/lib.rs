//! Native desktop notifications.
//!
//! Each platform shells out to its stock notifier (`notify-send`,
//! `terminal-notifier`/`osascript`, PowerShell toast). The bundled icon is
//! written to a temp file on demand, see [`icon`].

pub mod command;
pub mod error;
pub mod icon;
pub mod sender;

pub use {
    command::{NotifyCommand, Platform},
    error::{Error, Result},
    icon::{BundledIcon, IconSource},
    sender::{DesktopSender, NOTIFICATION_TITLE},
};
