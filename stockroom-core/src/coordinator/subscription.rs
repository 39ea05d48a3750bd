//! Live views of cached reads

use super::CacheCoordinator;
use crate::cache::{FetchResult, QueryKey};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// A view's interest in one key
///
/// While at least one subscription for a key is alive, invalidating its
/// resource triggers a background refetch. Dropping the subscription ends
/// that interest; the cached value stays until it goes stale.
pub struct Subscription {
    key: QueryKey,
    receiver: watch::Receiver<Option<Arc<Value>>>,
    coordinator: CacheCoordinator,
}

impl Subscription {
    pub(super) fn new(
        key: QueryKey,
        receiver: watch::Receiver<Option<Arc<Value>>>,
        coordinator: CacheCoordinator,
    ) -> Self {
        Self { key, receiver, coordinator }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest value delivered to this view
    pub fn current(&self) -> Option<Arc<Value>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next delivered value
    ///
    /// Yields `None` when the cache was cleared.
    pub async fn changed(&mut self) -> Option<Arc<Value>> {
        if self.receiver.changed().await.is_err() {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }

    /// Force a read through the coordinator
    pub async fn refresh(&self) -> FetchResult {
        self.coordinator.read(self.key.clone()).await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
