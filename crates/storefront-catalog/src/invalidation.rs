use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Cache tags invalidated by catalog mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Invalidation {
    Products,
    Categories,
}

impl Invalidation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Invalidation::Products => "products",
            Invalidation::Categories => "categories",
        }
    }
}

/// Fan-out of invalidation tags to any number of subscribers.
#[derive(Debug, Clone)]
pub struct Invalidator {
    tx: broadcast::Sender<Invalidation>,
}

impl Default for Invalidator {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl Invalidator {
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }

    pub fn emit(&self, tag: Invalidation) {
        // No subscribers is fine; nothing is cached.
        let receivers = self.tx.send(tag).unwrap_or(0);
        tracing::debug!(tag = tag.as_str(), receivers, "cache invalidated");
    }
}
