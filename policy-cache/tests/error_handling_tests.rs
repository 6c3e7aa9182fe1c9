// Error Handling Tests
// Tests for CacheError and EnqueueError messages

use policy_cache::{CacheError, CachePolicy, EnqueueError};

#[test]
fn test_configuration_mismatch_error() {
    let error = CacheError::ConfigurationMismatch {
        option: "idle_expiry",
        policy: CachePolicy::Lru,
    };

    assert!(error.to_string().contains("idle_expiry"));
    assert!(error.to_string().contains("LRU"));
}

#[test]
fn test_invalid_limit_error() {
    let error = CacheError::InvalidLimit(0);

    assert_eq!(error.to_string(), "Invalid limit: 0 (must be positive)");
}

#[test]
fn test_invalid_queue_capacity_error() {
    let error = CacheError::InvalidQueueCapacity("promote");

    assert!(error.to_string().contains("promote"));
}

#[test]
fn test_enqueue_errors() {
    assert_eq!(EnqueueError::Full("promote").to_string(), "promote queue full");
    assert_eq!(EnqueueError::Closed("evict").to_string(), "evict queue closed");
    assert_eq!(
        EnqueueError::DeadlineExceeded("insert").to_string(),
        "Deadline exceeded while waiting for insert queue"
    );
}

#[test]
fn test_error_is_std_error() {
    let error: Box<dyn std::error::Error + Send + Sync> = Box::new(CacheError::InvalidIdleExpiry);
    assert_eq!(
        error.to_string(),
        "Invalid idle expiry period: must be non-zero"
    );
}
