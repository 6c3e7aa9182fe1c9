pub mod cache;
pub mod config;
pub mod core;

// Re-export commonly used types
pub use crate::cache::{
    Cache, CacheEngine, DEFAULT_LIMIT, Deadline, EngineOptions, EvictionPolicy, Lfu, LfuCache,
    Lru, LruCache, new_cache,
};
pub use crate::config::{CacheConfig, QueueConfig};
pub use crate::core::{CacheError, CachePolicy, CacheStats, EnqueueError, Result};
