//! Multi-channel notification dispatch.
//!
//! Each delivery channel (Telegram, desktop notification, ...) implements
//! [`ChannelSender`]. The [`Dispatcher`] fans a composed message out to every
//! configured method and aggregates the per-channel results; the
//! [`Notifier`] wraps reload, composition and dispatch for one invocation.

pub mod compose;
pub mod dispatch;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod sender;

pub use {
    compose::{DEFAULT_TASK_LABEL, compose},
    dispatch::{ChannelFailure, DispatchOutcome, Dispatcher},
    error::{Error, Result},
    notifier::Notifier,
    registry::SenderRegistry,
    sender::{ChannelSender, DEFAULT_SEND_TIMEOUT},
};
