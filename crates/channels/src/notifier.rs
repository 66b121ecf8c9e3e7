use {
    chrono::Local,
    notify_mcp_config::ConfigStore,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    compose::compose,
    dispatch::{DispatchOutcome, Dispatcher},
    error::{Error, Result},
};

/// One notification invocation: reload settings, compose, dispatch.
///
/// Settings are read from disk on every call so edits made with
/// `notify-mcp config` apply to the next notification.
#[derive(Debug, Clone)]
pub struct Notifier {
    store: ConfigStore,
    dispatcher: Dispatcher,
}

impl Notifier {
    pub fn new(store: ConfigStore, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn notify(
        &self,
        task_label: &str,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        let settings = self.store.load().inspect_err(|e| {
            warn!(path = %self.store.path().display(), error = %e, "reload settings failed");
        })?;
        if settings.methods.is_empty() {
            warn!("settings contain no notification methods");
            return Err(Error::NoMethods);
        }

        let message = compose(
            task_label,
            settings.effective_notification_message(),
            Local::now().naive_local(),
        );
        debug!(task = task_label.trim(), "composed notification");

        Ok(self.dispatcher.dispatch(&settings, &message, cancel).await)
    }
}
