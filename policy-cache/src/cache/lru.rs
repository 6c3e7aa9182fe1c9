//! LRU (Least Recently Used) policy
//!
//! Head is the most recently used entry, tail the next victim. Inserts land
//! at the head and every hit moves its node back to the head.

use super::engine::{CacheEngine, EngineOptions};
use super::policy::EvictionPolicy;
use crate::core::{CachePolicy, OrderingList, Result, SlotId};

/// Recency ordering
#[derive(Debug, Clone, Copy, Default)]
pub struct Lru;

impl EvictionPolicy for Lru {
    const KIND: CachePolicy = CachePolicy::Lru;

    fn insert<V>(&self, list: &mut OrderingList<V>, id: SlotId) -> bool {
        list.push_front(id)
    }

    fn promote<V>(&self, list: &mut OrderingList<V>, id: SlotId) {
        let Some(node) = list.get_mut(id) else {
            return;
        };
        node.touch();

        // A pending node keeps the recorded access and is linked at the head
        list.move_to_head(id);
    }
}

/// Cache evicting the least recently used entry
pub type LruCache<V> = CacheEngine<V, Lru>;

impl<V: Send + Sync + 'static> CacheEngine<V, Lru> {
    /// Create an LRU cache holding at most `limit` entries
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(limit: usize) -> Result<Self> {
        Self::with_options(
            Lru,
            EngineOptions {
                limit,
                ..EngineOptions::default()
            },
        )
    }
}
