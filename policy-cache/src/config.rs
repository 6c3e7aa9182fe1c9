use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cache::engine::{
    DEFAULT_EVICT_QUEUE_CAPACITY, DEFAULT_LIMIT, DEFAULT_ORDERING_QUEUE_CAPACITY, EngineOptions,
};
use crate::core::{CachePolicy, Result};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    /// Maximum resident entries
    pub limit: usize,
    /// Idle expiry period (LFU only), written as `idle_expiry_ms` in files;
    /// fractional milliseconds are kept
    #[serde(rename = "idle_expiry_ms", with = "millis")]
    pub idle_expiry: Option<Duration>,
    pub queues: QueueConfig,
}

/// Maintenance queue depths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// Insertions and promotions
    pub ordering_capacity: usize,
    /// Eviction signals
    pub evict_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ordering_capacity: DEFAULT_ORDERING_QUEUE_CAPACITY,
            evict_capacity: DEFAULT_EVICT_QUEUE_CAPACITY,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Lru,
            limit: DEFAULT_LIMIT,
            idle_expiry: None,
            queues: QueueConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Default configuration for a policy
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Purge entries idle for longer than `period` (LFU only)
    pub fn with_idle_expiry(mut self, period: Duration) -> Self {
        self.idle_expiry = Some(period);
        self
    }

    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: CacheConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject options that do not fit the selected policy
    pub fn validate(&self) -> Result<()> {
        self.to_engine_options().validate(self.policy)
    }

    /// Convert to EngineOptions
    pub fn to_engine_options(&self) -> EngineOptions {
        EngineOptions {
            limit: self.limit,
            idle_expiry: self.idle_expiry,
            ordering_queue_capacity: self.queues.ordering_capacity,
            evict_queue_capacity: self.queues.evict_capacity,
        }
    }
}

/// Optional `Duration` as (possibly fractional) milliseconds
mod millis {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    const NANOS_PER_MILLI: u128 = 1_000_000;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            None => serializer.serialize_none(),
            Some(period) => {
                let nanos = period.as_nanos();
                if nanos % NANOS_PER_MILLI == 0 {
                    serializer.serialize_some(&((nanos / NANOS_PER_MILLI) as u64))
                } else {
                    serializer.serialize_some(&(nanos as f64 / NANOS_PER_MILLI as f64))
                }
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(ms) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if !ms.is_finite() || ms < 0.0 {
            return Err(D::Error::custom(format!(
                "idle_expiry_ms must be a non-negative number, got {}",
                ms
            )));
        }
        Ok(Some(Duration::from_nanos(
            (ms * NANOS_PER_MILLI as f64).round() as u64,
        )))
    }
}
