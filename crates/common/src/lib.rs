//! Error plumbing shared by the notify-mcp crates.

pub mod error;

pub use error::FromMessage;
