//! Cached read results with a staleness deadline

use tokio::time::{Duration, Instant};

/// A cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the value was fetched
    pub fetched_at: Instant,

    /// When the value stops being served without a refetch
    pub stale_at: Instant,

    /// Number of reads served from this entry
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    /// Create an entry fetched now that goes stale after `stale_after`
    pub fn new(value: V, stale_after: Duration) -> Self {
        let now = Instant::now();
        Self { value, fetched_at: now, stale_at: now + stale_after, access_count: 0 }
    }

    /// Mark this entry as read
    pub fn touch(&mut self) {
        self.access_count += 1;
    }

    pub fn is_stale(&self) -> bool {
        Instant::now() >= self.stale_at
    }

    /// Force the next read to refetch
    pub fn mark_stale(&mut self) {
        self.stale_at = self.fetched_at;
    }

    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }
}
