use serde::Serialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A live key and how long it has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub expires_in_ms: u64,
}

/// String-keyed map whose entries disappear after their time-to-live.
///
/// Expiry is measured with `tokio::time::Instant`, so paused test clocks
/// drive it. Expired entries are invisible to `get` and are dropped on the
/// next write or purge.
pub struct ExpiringCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone + Send + Sync + 'static> ExpiringCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` for `ttl`; a zero ttl disables caching for the key.
    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut entries = self.entries.write().await;

        if ttl.is_zero() {
            entries.remove(&key);
            return;
        }

        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Removes the key and returns its value even if it had already expired.
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;
        entries.remove(key).map(|entry| entry.value)
    }

    pub async fn remove_where(&self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Live keys sorted by name.
    pub async fn entries(&self) -> Vec<EntryInfo> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut live: Vec<EntryInfo> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, entry)| EntryInfo {
                key: key.clone(),
                expires_in_ms: u64::try_from((entry.expires_at - now).as_millis())
                    .unwrap_or(u64::MAX),
            })
            .collect();
        live.sort_by(|a, b| a.key.cmp(&b.key));
        live
    }

    pub async fn len(&self) -> usize {
        self.entries().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn start_background_purge(cache: Arc<Self>, interval_seconds: u64) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds));
            interval.tick().await; // Skip the first immediate tick

            loop {
                interval.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!("Purged {} expired cache entries", purged);
                }
            }
        });
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
