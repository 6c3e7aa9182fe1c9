use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::arena::SlotId;

/// Cache entry with its ordering metadata
#[derive(Debug)]
pub struct Node<V> {
    /// Key, fixed at creation
    pub key: String,
    /// Opaque caller payload
    pub value: V,
    /// Access counter (LFU)
    pub frequency: u64,
    created_at: Instant,
    /// Nanoseconds after `created_at` of the latest access; readers refresh
    /// it under the shared lock
    last_used: AtomicU64,
    pub(crate) prev: Option<SlotId>,
    pub(crate) next: Option<SlotId>,
    pub(crate) linked: bool,
}

impl<V> Node<V> {
    /// Create a detached node with zero frequency
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
            frequency: 0,
            created_at: Instant::now(),
            last_used: AtomicU64::new(0),
            prev: None,
            next: None,
            linked: false,
        }
    }

    /// Record an access: bump frequency and refresh the access time
    pub fn touch(&mut self) {
        self.frequency = self.frequency.saturating_add(1);
        self.mark_used();
    }

    /// Refresh the access time without reordering
    pub fn mark_used(&self) {
        let now = self.created_at.elapsed().as_nanos() as u64;
        self.last_used.fetch_max(now, Ordering::Relaxed);
    }

    /// Time since the last access (or creation)
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_nanos(self.last_used.load(Ordering::Relaxed));
        self.created_at.elapsed().saturating_sub(last)
    }

    /// Whether the node is currently part of the ordering list
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

/// Eviction policy of a cache instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Least Recently Used
    #[default]
    Lru,
    /// Least Frequently Used, ties broken by recency
    Lfu,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => f.write_str("LRU"),
            Self::Lfu => f.write_str("LFU"),
        }
    }
}

/// Point-in-time cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Successful lookups
    pub hits: u64,
    /// Lookups of absent or idle-expired keys
    pub misses: u64,
    /// Nodes linked into the ordering list
    pub inserts: u64,
    /// Nodes removed for capacity
    pub evictions: u64,
    /// Nodes removed by the idle sweep
    pub expirations: u64,
    /// Promotions dropped because the queue was full, closed or timed out
    pub dropped_promotions: u64,
    /// Insertions rolled back because the enqueue was abandoned
    pub abandoned_inserts: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters shared between the facade and the workers
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    dropped_promotions: AtomicU64,
    abandoned_inserts: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_dropped_promotion(&self) {
        self.dropped_promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned_insert(&self) {
        self.abandoned_inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            dropped_promotions: self.dropped_promotions.load(Ordering::Relaxed),
            abandoned_inserts: self.abandoned_inserts.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_touch() {
        let mut node = Node::new("k", 1);
        assert_eq!(node.frequency, 0);
        assert!(!node.is_linked());

        node.touch();
        node.touch();

        assert_eq!(node.frequency, 2);
    }

    #[test]
    fn test_mark_used_resets_idle_time() {
        let node = Node::new("k", 1);
        std::thread::sleep(Duration::from_millis(30));
        assert!(node.idle_for() >= Duration::from_millis(30));

        node.mark_used();

        assert!(node.idle_for() < Duration::from_millis(30));
        assert_eq!(node.frequency, 0);
    }

    #[test]
    fn test_policy_serde_lowercase() {
        let policy: CachePolicy = serde_yaml::from_str("lfu").unwrap();
        assert_eq!(policy, CachePolicy::Lfu);
        assert_eq!(serde_yaml::to_string(&CachePolicy::Lru).unwrap().trim(), "lru");
        assert_eq!(CachePolicy::Lfu.to_string(), "LFU");
    }

    #[test]
    fn test_stats_snapshot_and_hit_rate() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();
        recorder.record_expirations(2);

        let stats = recorder.snapshot();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
