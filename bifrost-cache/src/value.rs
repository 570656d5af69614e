use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// A cached value together with the instant it was stored.
///
/// Freshness is evaluated against a TTL owned by the cache, not the value;
/// the same entry can be fresh for one reader and stale for a cache
/// configured with a shorter TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    stored_at: DateTime<Utc>,
}

impl<T> CacheValue<T> {
    /// Wraps `data`, stamping it with the current time.
    pub fn new(data: T) -> Self {
        CacheValue {
            data,
            stored_at: Utc::now(),
        }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the data was stored.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Consumes the value and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Whether the entry is still within `ttl` of its storage time.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Utc::now().signed_duration_since(self.stored_at) <= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_within_ttl() {
        let value = CacheValue::new(42);
        assert!(value.is_fresh(Duration::from_secs(60)));
        assert_eq!(*value.data(), 42);
    }

    #[test]
    fn stale_after_ttl() {
        let value = CacheValue::new("v");
        std::thread::sleep(Duration::from_millis(5));
        assert!(!value.is_fresh(Duration::from_millis(1)));
    }

    #[test]
    fn oversized_ttl_saturates() {
        let value = CacheValue::new(());
        assert!(value.is_fresh(Duration::MAX));
    }
}
