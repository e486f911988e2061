//! Generic TTL cache used for in-flight request coalescing and cross-request
//! tool-result stitching.
//!
//! Both `ChatProxyCache` and `ToolCallsInProcessCache` are instances of the
//! same [`TtlCache`] with different value types and default TTLs.

mod error;
mod ttl;

pub use error::CacheError;
pub use ttl::TtlCache;

use async_trait::async_trait;
use std::time::Duration;

/// Cache trait for key-value storage with optional per-entry TTL.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Gets a value by key. Returns `None` if missing or expired. Does not renew TTL.
    async fn get(&self, key: &K) -> Option<V>;

    /// Sets a value with an optional TTL override (falls back to the cache's default TTL).
    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Gets and removes a value by key in one atomic step.
    async fn pop(&self, key: &K) -> Option<V>;

    /// Removes a value by key without returning it.
    async fn delete(&self, key: &K) -> Result<(), CacheError>;

    /// Clears all entries.
    async fn clear(&self) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn test_cache_trait_object() {
        let cache: Box<dyn Cache<String, String>> = Box::new(TtlCache::new(StdDuration::from_secs(60)));
        cache
            .put("key".to_string(), "value".to_string(), None)
            .await
            .unwrap();
        assert_eq!(cache.get(&"key".to_string()).await, Some("value".to_string()));
    }
}
