//! Fan-out of one message to every configured method.
//!
//! All methods are attempted, each bounded by its sender's timeout; a
//! failure on one channel never stops delivery to the others. The overall
//! outcome is a success iff at least one channel succeeded.

use {
    futures::future::join_all,
    notify_mcp_config::{Method, MethodType, Settings},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    registry::SenderRegistry,
};

/// A channel that did not deliver, with the reason for the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub method: MethodType,
    pub reason: String,
}

/// Aggregated result of one dispatch, in stored method order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub succeeded: Vec<MethodType>,
    pub failed: Vec<ChannelFailure>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !self.succeeded.is_empty()
    }

    pub fn failed_methods(&self) -> Vec<MethodType> {
        self.failed.iter().map(|f| f.method).collect()
    }

    /// Caller-facing text. Failed channels are listed as a note on success.
    pub fn summary(&self) -> String {
        if !self.is_success() {
            return "所有通知方式均发送失败".to_string();
        }
        let mut text = format!("通知成功，成功渠道: {}", join(&self.succeeded));
        if !self.failed.is_empty() {
            text.push_str(&format!("；失败渠道: {}", join(&self.failed_methods())));
        }
        text
    }
}

fn join(kinds: &[MethodType]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sends a message to every method in a [`Settings`] document.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: SenderRegistry,
}

impl Dispatcher {
    pub fn new(registry: SenderRegistry) -> Self {
        Self { registry }
    }

    /// Attempt every method concurrently and wait for all of them.
    ///
    /// Cancelling `cancel` aborts sends still in flight; those count as
    /// failures while already finished sends keep their result.
    pub async fn dispatch(
        &self,
        settings: &Settings,
        message: &str,
        cancel: &CancellationToken,
    ) -> DispatchOutcome {
        debug!(
            methods = ?settings.method_types(),
            text = message,
            "dispatching notification"
        );

        let attempts = settings
            .methods
            .iter()
            .map(|method| self.attempt(method, message, cancel));
        let results = join_all(attempts).await;

        let mut outcome = DispatchOutcome::default();
        for (method, result) in settings.methods.iter().zip(results) {
            let kind = method.method_type();
            match result {
                Ok(()) => {
                    info!(method = %kind, text = message, "notification sent");
                    outcome.succeeded.push(kind);
                },
                Err(e) => {
                    warn!(method = %kind, error = %e, "notification failed");
                    outcome.failed.push(ChannelFailure {
                        method: kind,
                        reason: e.to_string(),
                    });
                },
            }
        }
        outcome
    }

    async fn attempt(
        &self,
        method: &Method,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let kind = method.method_type();
        let sender = self
            .registry
            .get(kind)
            .ok_or(Error::NoSender { method: kind })?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let timeout = sender.timeout();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, sender.send(method, message)) => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(Error::Send {
                    method: kind,
                    reason: format!("{e:#}"),
                }),
                Err(_) => Err(Error::Timeout {
                    method: kind,
                    timeout,
                }),
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use {
        async_trait::async_trait,
        notify_mcp_config::TelegramConfig,
    };

    use super::*;
    use crate::sender::ChannelSender;

    #[derive(Clone, Copy)]
    pub(crate) enum Behavior {
        Succeed,
        Fail,
        Sleep(Duration),
    }

    pub(crate) struct StubSender {
        kind: MethodType,
        behavior: Behavior,
        timeout: Duration,
        pub(crate) sent: Mutex<Vec<String>>,
    }

    impl StubSender {
        pub(crate) fn new(kind: MethodType, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                kind,
                behavior,
                timeout: Duration::from_secs(5),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn with_timeout(kind: MethodType, behavior: Behavior, timeout: Duration) -> Arc<Self> {
            Arc::new(Self {
                kind,
                behavior,
                timeout,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChannelSender for StubSender {
        fn method_type(&self) -> MethodType {
            self.kind
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn send(&self, method: &Method, message: &str) -> anyhow::Result<()> {
            assert_eq!(method.method_type(), self.kind);
            match self.behavior {
                Behavior::Succeed => {},
                Behavior::Fail => anyhow::bail!("{} is down", self.kind),
                Behavior::Sleep(d) => tokio::time::sleep(d).await,
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    pub(crate) fn both_methods() -> Settings {
        Settings {
            methods: vec![
                Method::telegram(TelegramConfig::new(None, "42", "abc")).unwrap(),
                Method::os(),
            ],
            ..Default::default()
        }
    }

    fn dispatcher(senders: Vec<Arc<StubSender>>) -> Dispatcher {
        let mut registry = SenderRegistry::new();
        for sender in senders {
            registry.register(sender);
        }
        Dispatcher::new(registry)
    }

    #[tokio::test]
    async fn partial_failure_is_success() {
        let telegram = StubSender::new(MethodType::Telegram, Behavior::Fail);
        let os = StubSender::new(MethodType::Os, Behavior::Succeed);
        let dispatcher = dispatcher(vec![telegram, os.clone()]);

        let outcome = dispatcher
            .dispatch(&both_methods(), "hello", &CancellationToken::new())
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.succeeded, vec![MethodType::Os]);
        assert_eq!(outcome.failed_methods(), vec![MethodType::Telegram]);
        assert!(outcome.failed[0].reason.contains("telegram is down"));
        assert_eq!(*os.sent.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn all_failed_is_failure() {
        let dispatcher = dispatcher(vec![
            StubSender::new(MethodType::Telegram, Behavior::Fail),
            StubSender::new(MethodType::Os, Behavior::Fail),
        ]);

        let outcome = dispatcher
            .dispatch(&both_methods(), "hello", &CancellationToken::new())
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.succeeded.is_empty());
        assert_eq!(
            outcome.failed_methods(),
            vec![MethodType::Telegram, MethodType::Os]
        );
        assert_eq!(outcome.summary(), "所有通知方式均发送失败");
    }

    #[tokio::test]
    async fn missing_sender_is_a_channel_failure() {
        let dispatcher = dispatcher(vec![StubSender::new(MethodType::Os, Behavior::Succeed)]);

        let outcome = dispatcher
            .dispatch(&both_methods(), "hello", &CancellationToken::new())
            .await;

        assert_eq!(outcome.succeeded, vec![MethodType::Os]);
        assert_eq!(
            outcome.failed[0].reason,
            "no sender registered for method type telegram"
        );
    }

    #[tokio::test]
    async fn slow_sender_times_out_alone() {
        let dispatcher = dispatcher(vec![
            StubSender::with_timeout(
                MethodType::Telegram,
                Behavior::Sleep(Duration::from_secs(5)),
                Duration::from_millis(20),
            ),
            StubSender::new(MethodType::Os, Behavior::Succeed),
        ]);

        let outcome = dispatcher
            .dispatch(&both_methods(), "hello", &CancellationToken::new())
            .await;

        assert_eq!(outcome.succeeded, vec![MethodType::Os]);
        assert!(outcome.failed[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn cancelled_before_start_fails_every_channel() {
        let dispatcher = dispatcher(vec![
            StubSender::new(MethodType::Telegram, Behavior::Succeed),
            StubSender::new(MethodType::Os, Behavior::Succeed),
        ]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = dispatcher.dispatch(&both_methods(), "hello", &cancel).await;

        assert!(!outcome.is_success());
        assert!(outcome.failed.iter().all(|f| f.reason == "dispatch cancelled"));
    }

    #[tokio::test]
    async fn cancellation_keeps_completed_results() {
        let dispatcher = dispatcher(vec![
            StubSender::new(MethodType::Telegram, Behavior::Sleep(Duration::from_secs(5))),
            StubSender::new(MethodType::Os, Behavior::Succeed),
        ]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = dispatcher.dispatch(&both_methods(), "hello", &cancel).await;

        assert_eq!(outcome.succeeded, vec![MethodType::Os]);
        assert_eq!(outcome.failed_methods(), vec![MethodType::Telegram]);
        assert_eq!(outcome.failed[0].reason, "dispatch cancelled");
    }

    #[test]
    fn summary_lists_failed_channels_on_success() {
        let outcome = DispatchOutcome {
            succeeded: vec![MethodType::Os],
            failed: vec![ChannelFailure {
                method: MethodType::Telegram,
                reason: "boom".into(),
            }],
        };
        assert_eq!(outcome.summary(), "通知成功，成功渠道: os；失败渠道: telegram");

        let outcome = DispatchOutcome {
            succeeded: vec![MethodType::Telegram, MethodType::Os],
            failed: vec![],
        };
        assert_eq!(outcome.summary(), "通知成功，成功渠道: telegram, os");
    }
}
