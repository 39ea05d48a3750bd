//! Process-wide query cache
//!
//! Holds one slot per [`QueryKey`]: the last fetched value, the shared
//! in-flight fetch (if any), a generation counter bumped on every
//! invalidation, and a watch channel feeding live subscriptions.
//!
//! Only the coordinator mutates slots; everything else reads through
//! [`QueryCache::peek`] and friends.

use super::entry::CacheEntry;
use super::key::QueryKey;
use crate::coordinator::Resource;
use crate::transport::ApiError;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;

/// Result of one fetch, shared by every caller awaiting it
pub type FetchResult = Result<Arc<Value>, ApiError>;

pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

pub(crate) struct Slot {
    pub(crate) entry: Option<CacheEntry<Arc<Value>>>,
    pub(crate) in_flight: Option<SharedFetch>,
    pub(crate) generation: u64,
    pub(crate) watch: watch::Sender<Option<Arc<Value>>>,
}

impl Slot {
    fn new() -> Self {
        let (watch, _) = watch::channel(None);
        Self { entry: None, in_flight: None, generation: 0, watch }
    }

    /// Value that may be served without refetching
    pub(crate) fn fresh_value(&mut self) -> Option<Arc<Value>> {
        let entry = self.entry.as_mut().filter(|entry| !entry.is_stale())?;
        entry.touch();
        Some(Arc::clone(&entry.value))
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        self.watch.receiver_count() > 0
    }
}

/// Keyed store of read results
#[derive(Default)]
pub struct QueryCache {
    slots: HashMap<QueryKey, Slot>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fetched value, fresh or stale
    pub fn peek(&self, key: &QueryKey) -> Option<Arc<Value>> {
        self.slots.get(key)?.entry.as_ref().map(|entry| Arc::clone(&entry.value))
    }

    /// Whether a read of `key` would be served without a fetch
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .is_some_and(|entry| !entry.is_stale())
    }

    /// Whether a fetch for `key` is currently shared by readers
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.slots.get(key).is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<_> = self.slots.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn slot_mut(&mut self, key: &QueryKey) -> &mut Slot {
        self.slots.entry(key.clone()).or_insert_with(Slot::new)
    }

    /// Store the result of a fetch started at `generation`
    ///
    /// Returns `false` when the key was invalidated after the fetch started;
    /// such results are handed to their callers but never cached.
    pub(crate) fn settle(
        &mut self,
        key: &QueryKey,
        generation: u64,
        result: &FetchResult,
        stale_after: Duration,
    ) -> bool {
        let slot = self.slot_mut(key);
        if slot.generation != generation {
            return false;
        }

        slot.in_flight = None;
        if let Ok(value) = result {
            slot.entry = Some(CacheEntry::new(Arc::clone(value), stale_after));
            slot.watch.send_replace(Some(Arc::clone(value)));
        }
        true
    }

    /// Mark every key of `resources` stale and detach in-flight fetches
    ///
    /// Returns the keys that have live subscribers and need a refetch.
    pub(crate) fn invalidate(&mut self, resources: &[Resource]) -> Vec<QueryKey> {
        let mut refetch = Vec::new();
        for (key, slot) in self.slots.iter_mut() {
            if !resources.contains(&key.resource) {
                continue;
            }
            slot.generation += 1;
            slot.in_flight = None;
            if let Some(entry) = slot.entry.as_mut() {
                entry.mark_stale();
            }
            if slot.has_subscribers() {
                refetch.push(key.clone());
            }
        }
        refetch.sort();
        refetch
    }

    /// Drop every value, e.g. when the signed-in user changes
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.generation += 1;
            slot.in_flight = None;
            slot.entry = None;
            slot.watch.send_replace(None);
        }
    }
}
