use std::{collections::HashMap, sync::Arc};

use notify_mcp_config::MethodType;

use crate::sender::ChannelSender;

/// Senders wired in at startup, keyed by the method type they handle.
#[derive(Clone, Default)]
pub struct SenderRegistry {
    senders: HashMap<MethodType, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sender, replacing any previous one for the same type.
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.method_type(), sender);
    }

    #[must_use]
    pub fn with(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.register(sender);
        self
    }

    pub fn get(&self, kind: MethodType) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&kind).cloned()
    }

    pub fn list(&self) -> Vec<MethodType> {
        let mut kinds: Vec<_> = self.senders.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl std::fmt::Debug for SenderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderRegistry")
            .field("senders", &self.list())
            .finish()
    }
}
