use thiserror::Error;

use super::types::CachePolicy;

/// Main error type for cache construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Option {option} is not compatible with {policy} cache")]
    ConfigurationMismatch {
        option: &'static str,
        policy: CachePolicy,
    },

    #[error("Invalid limit: {0} (must be positive)")]
    InvalidLimit(usize),

    #[error("Invalid idle expiry period: must be non-zero")]
    InvalidIdleExpiry,

    #[error("Invalid queue capacity for {0}: must be positive")]
    InvalidQueueCapacity(&'static str),
}

/// Why a maintenance job did not reach its queue
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("{0} queue closed")]
    Closed(&'static str),

    #[error("{0} queue full")]
    Full(&'static str),

    #[error("Deadline exceeded while waiting for {0} queue")]
    DeadlineExceeded(&'static str),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
