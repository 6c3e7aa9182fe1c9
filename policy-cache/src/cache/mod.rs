//! Cache Module
//!
//! Provides the two eviction engines behind one interface:
//! - LRU: recency ordered, evicts the least recently used entry
//! - LFU: frequency ordered, evicts the least frequently used entry, with
//!   optional idle expiry
//!
//! Both run the same maintenance pipeline: `get`/`set` only touch the index,
//! background workers apply insertions, promotions and evictions.

use async_trait::async_trait;

pub mod engine;
pub mod lfu;
pub mod lru;
pub mod pipeline;
pub mod policy;

pub use engine::{CacheEngine, DEFAULT_LIMIT, EngineOptions};
pub use lfu::{Lfu, LfuCache};
pub use lru::{Lru, LruCache};
pub use pipeline::Deadline;
pub use policy::EvictionPolicy;

use crate::config::CacheConfig;
use crate::core::{CachePolicy, CacheStats, Result};

/// Capability set shared by every cache policy
#[async_trait]
pub trait Cache<V>: Send + Sync {
    /// Look up a value; `None` is a miss
    async fn get(&self, key: &str) -> Option<V>;

    /// Look up a value, bounding the promotion enqueue by `deadline`
    async fn get_with(&self, key: &str, deadline: Deadline) -> Option<V>;

    /// Store a value unless the key is present (first write wins)
    ///
    /// Never waits for maintenance: if the ordering queue is full the
    /// insertion is dropped and the key is not cached.
    async fn set(&self, key: &str, value: V);

    /// Store a value, bounding the insertion enqueue by `deadline`
    async fn set_with(&self, key: &str, value: V, deadline: Deadline);

    /// Stop the background workers and drop every entry; idempotent
    async fn close(&self);

    /// Wait for all queued maintenance to be applied
    async fn flush(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn policy(&self) -> CachePolicy;

    fn stats(&self) -> CacheStats;
}

#[async_trait]
impl<V, P> Cache<V> for CacheEngine<V, P>
where
    V: Clone + Send + Sync + 'static,
    P: EvictionPolicy,
{
    async fn get(&self, key: &str) -> Option<V> {
        CacheEngine::get(self, key).await
    }

    async fn get_with(&self, key: &str, deadline: Deadline) -> Option<V> {
        CacheEngine::get_with(self, key, deadline).await
    }

    async fn set(&self, key: &str, value: V) {
        CacheEngine::set(self, key, value).await
    }

    async fn set_with(&self, key: &str, value: V, deadline: Deadline) {
        CacheEngine::set_with(self, key, value, deadline).await
    }

    async fn close(&self) {
        CacheEngine::close(self).await
    }

    async fn flush(&self) {
        CacheEngine::flush(self).await
    }

    fn len(&self) -> usize {
        CacheEngine::len(self)
    }

    fn policy(&self) -> CachePolicy {
        CacheEngine::policy(self)
    }

    fn stats(&self) -> CacheStats {
        CacheEngine::stats(self)
    }
}

/// Build the cache selected by `config`
///
/// Options that do not fit the chosen policy are rejected here. Must be
/// called from within a tokio runtime.
pub fn new_cache<V>(config: &CacheConfig) -> Result<Box<dyn Cache<V>>>
where
    V: Clone + Send + Sync + 'static,
{
    config.validate()?;
    let options = config.to_engine_options();

    let cache: Box<dyn Cache<V>> = match config.policy {
        CachePolicy::Lru => Box::new(CacheEngine::with_options(Lru, options)?),
        CachePolicy::Lfu => Box::new(CacheEngine::with_options(Lfu, options)?),
    };
    Ok(cache)
}
