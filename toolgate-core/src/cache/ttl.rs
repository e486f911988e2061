//! TTL-bearing in-memory cache: one mutex, sweep expired entries on every op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::{Cache, CacheError};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self) -> bool {
        self.expires_at < Instant::now()
    }
}

/// Generic key-value cache with per-entry expiry.
///
/// Every operation first sweeps expired entries under the same lock acquisition
/// (acceptable: N is small, in-flight requests and pending tool-call batches).
/// `get` never renews TTL; `put` without an explicit TTL uses the cache's default.
pub struct TtlCache<K, V> {
    default_ttl: Duration,
    data: Arc<Mutex<HashMap<K, Entry<V>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn sweep(map: &mut HashMap<K, Entry<V>>) {
        map.retain(|_, entry| !entry.is_expired());
    }

    /// Atomically returns the existing value for `key`, or inserts and returns
    /// `default()` if absent — a single lock acquisition, so concurrent callers
    /// racing on the same key never both win the insert.
    pub async fn get_or_insert_with<F>(&self, key: K, ttl: Option<Duration>, default: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut map = self.data.lock().await;
        Self::sweep(&mut map);
        if let Some(entry) = map.get(&key) {
            return entry.value.clone();
        }
        let value = default();
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        map.insert(key, Entry { value: value.clone(), expires_at });
        value
    }
}

#[async_trait::async_trait]
impl<K, V> Cache<K, V> for TtlCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut map = self.data.lock().await;
        Self::sweep(&mut map);
        map.get(key).map(|e| e.value.clone())
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        let mut map = self.data.lock().await;
        Self::sweep(&mut map);
        map.insert(key, Entry { value, expires_at });
        Ok(())
    }

    async fn pop(&self, key: &K) -> Option<V> {
        let mut map = self.data.lock().await;
        Self::sweep(&mut map);
        map.remove(key).map(|e| e.value)
    }

    async fn delete(&self, key: &K) -> Result<(), CacheError> {
        let mut map = self.data.lock().await;
        map.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut map = self.data.lock().await;
        map.clear();
        Ok(())
    }
}
