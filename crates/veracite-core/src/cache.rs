//! Read-through memoization for derived lookups.
//!
//! Entries are never invalidated automatically; callers that need a refresh
//! point use `clear`. Concurrent reads proceed in parallel, writes are
//! serialized, and a same-key race simply recomputes an idempotent value.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Thread-safe string-keyed memo cache.
#[derive(Debug, Clone)]
pub struct ReadCache<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V: Clone> ReadCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let store = self.inner.read().await;
        store.get(key).cloned()
    }

    pub async fn put(&self, key: String, value: V) {
        let mut store = self.inner.write().await;
        store.insert(key, value);
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.clear();
    }
}

impl<V: Clone> Default for ReadCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
