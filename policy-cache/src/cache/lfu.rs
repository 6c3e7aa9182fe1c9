//! LFU (Least Frequently Used) Cache Implementation
//!
//! The ordering list is kept in non-increasing frequency order, split into
//! bands of equal frequency. Inside a band the most recently inserted or
//! promoted node sits in front, so the tail is always the least recently
//! touched node of the lowest band.
//!
//! New nodes start at frequency 0 and enter at the front of the lowest band.
//! A hit bumps the frequency by one and moves the node to the front of its
//! new band, which is usually the band right in front of it.
//!
//! With an idle expiry period configured, a sweep worker wakes up once per
//! period and evicts every node not accessed for longer than that period.

use std::time::Duration;

use super::engine::{CacheEngine, EngineOptions};
use super::policy::EvictionPolicy;
use crate::core::{CachePolicy, OrderingList, Result, SlotId};

/// Frequency ordering with recency tie-break
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfu;

impl EvictionPolicy for Lfu {
    const KIND: CachePolicy = CachePolicy::Lfu;

    fn insert<V>(&self, list: &mut OrderingList<V>, id: SlotId) -> bool {
        list.insert_by_frequency(id)
    }

    fn promote<V>(&self, list: &mut OrderingList<V>, id: SlotId) {
        let Some(node) = list.get_mut(id) else {
            return;
        };
        node.touch();

        // Pending nodes keep the bumped frequency and are placed by it on insert
        if node.is_linked() {
            list.reposition(id);
        }
    }
}

/// Cache evicting the least frequently used entry
pub type LfuCache<V> = CacheEngine<V, Lfu>;

impl<V: Send + Sync + 'static> CacheEngine<V, Lfu> {
    /// Create an LFU cache holding at most `limit` entries, optionally
    /// purging entries idle for longer than `idle_expiry`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(limit: usize, idle_expiry: Option<Duration>) -> Result<Self> {
        Self::with_options(
            Lfu,
            EngineOptions {
                limit,
                idle_expiry,
                ..EngineOptions::default()
            },
        )
    }
}
