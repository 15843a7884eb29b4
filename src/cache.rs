//! Per-key store of assembled values.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

/// In-memory map from a domain key (city code, station pair and date) to a
/// value that was fetched successfully for exactly that key.
///
/// Entries live as long as the cache; there is no eviction. Values are
/// shared behind `Arc` and only ever swapped out whole through
/// [`KeyedCache::replace`]. Concurrent misses on the same key are not
/// deduplicated; each caller fetches independently and the last writer wins.
pub struct KeyedCache<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Returns the stored value for `key`, or runs `fetch` and stores its
    /// success. A failed fetch leaves the cache untouched so the next call
    /// retries.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!(cache = self.name, key = ?key, "Cache hit");
            return Ok(hit);
        }

        debug!(cache = self.name, key = ?key, "Cache miss, fetching");
        let value = Arc::new(fetch().await?);
        self.entries.write().await.insert(key, value.clone());
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn replace(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.write().await.insert(key, value.clone());
        value
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
