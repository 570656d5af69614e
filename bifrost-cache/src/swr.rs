use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{Instrument, debug, info_span, warn};

use crate::value::CacheValue;

/// Default time-to-live for cached entries: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct SwrCacheInner<V> {
    entries: DashMap<String, CacheValue<V>>,
    // Keys with a background refresh in flight. Guarded by the dashmap
    // entry API so check-then-mark is atomic per key.
    refreshing: DashMap<String, ()>,
    ttl: Duration,
}

/// Keyed stale-while-revalidate cache.
///
/// Reads fall into three paths:
///
/// 1. **First miss**: the producer is awaited inline; its value is stored
///    and returned, its error propagated without storing.
/// 2. **Fresh hit**: the stored value is returned, the producer is never
///    invoked.
/// 3. **Expired hit**: the stored value is returned immediately and the
///    producer is spawned in the background, unless a refresh for the key
///    is already in flight. A failed refresh leaves the stale entry in
///    place and is only logged.
///
/// Cloning the cache is cheap and clones share all state.
#[derive(Debug)]
pub struct SwrCache<V> {
    inner: Arc<SwrCacheInner<V>>,
}

impl<V> Clone for SwrCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for SwrCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> SwrCache<V> {
    /// Creates an empty cache where entries are fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SwrCacheInner {
                entries: DashMap::new(),
                refreshing: DashMap::new(),
                ttl,
            }),
        }
    }

    /// The TTL applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Number of stored entries, fresh and stale alike.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Whether an entry exists for `key`, regardless of freshness.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }
}

impl<V> SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Looks up `key`, producing the value on a first miss and refreshing
    /// stale entries in the background.
    ///
    /// Only a first-ever miss awaits `producer`; stale reads return
    /// synchronously with the previous value. The miss-path producer runs
    /// as its own task, so its result still lands in the cache when the
    /// caller goes away mid-flight.
    pub async fn get<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if let Some(entry) = self.inner.entries.get(key) {
            if entry.is_fresh(self.inner.ttl) {
                debug!(key, "cache hit");
                return Ok(entry.data().clone());
            }
            let stale = entry.data().clone();
            // Release the shard guard before scheduling the refresh.
            drop(entry);
            debug!(key, "cache stale, serving previous value");
            self.spawn_refresh(key, producer);
            return Ok(stale);
        }

        debug!(key, "cache miss");
        let inner = Arc::clone(&self.inner);
        let key = key.to_owned();
        let fut = producer();
        let task = tokio::spawn(async move {
            let value = fut.await?;
            inner.entries.insert(key, CacheValue::new(value.clone()));
            Ok(value)
        });
        task.await.expect("cache producer task panicked")
    }

    /// Schedules a background refresh for `key` unless one is in flight.
    fn spawn_refresh<F, Fut, E>(&self, key: &str, producer: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        match self.inner.refreshing.entry(key.to_owned()) {
            Entry::Occupied(_) => {
                debug!(key, "refresh already in flight");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }

        let inner = Arc::clone(&self.inner);
        let key = key.to_owned();
        let fut = producer();
        let span = info_span!("swr_refresh", key = %key);
        tokio::spawn(
            async move {
                match fut.await {
                    Ok(value) => {
                        inner.entries.insert(key.clone(), CacheValue::new(value));
                        debug!("refresh complete");
                    }
                    Err(error) => {
                        warn!(%error, "background refresh failed, stale entry retained");
                    }
                }
                inner.refreshing.remove(&key);
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_stores_and_returns() {
        let cache: SwrCache<String> = SwrCache::new(Duration::from_secs(60));
        let value = cache
            .get("k", || async { Ok::<_, std::io::Error>("v1".to_owned()) })
            .await
            .unwrap();
        assert_eq!(value, "v1");
        assert!(cache.contains_key("k"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn miss_failure_is_not_stored() {
        let cache: SwrCache<String> = SwrCache::new(Duration::from_secs(60));
        let result = cache
            .get("k", || async {
                Err::<String, _>(std::io::Error::other("boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains_key("k"));
    }
}
