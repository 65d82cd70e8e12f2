//! Timed cache entries for process-wide resources
//!
//! The song catalog and the spreadsheet connection are both fetched lazily
//! and reused until their time-to-live elapses. Staleness is a pure function
//! of the entry and a caller-supplied `now`, so expiry can be tested without
//! touching the clock.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cached value together with the time it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// `now - fetched_at > ttl`
    ///
    /// A `now` earlier than `fetched_at` (clock stepped backwards) counts as fresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age > ttl,
            Err(_) => false,
        }
    }
}

/// Single-slot cache with a fixed time-to-live
///
/// Not synchronised; owners wrap it in whatever lock their access pattern needs.
#[derive(Debug)]
pub struct TimedCache<T> {
    ttl: Duration,
    entry: Option<CacheEntry<T>>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// True when empty or when the held entry has outlived the ttl
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .map_or(true, |entry| entry.is_stale(now, self.ttl))
    }

    /// Clone of the cached value, if present and still fresh
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<T> {
        match &self.entry {
            Some(entry) if !entry.is_stale(now, self.ttl) => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Replace the cached value, returning a clone of it
    pub fn store(&mut self, value: T, now: DateTime<Utc>) -> T {
        self.entry = Some(CacheEntry::new(value.clone(), now));
        value
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_entry_fresh_within_ttl() {
        let entry = CacheEntry::new(1, at(0));
        assert!(!entry.is_stale(at(3600), Duration::from_secs(3600)));
    }

    #[test]
    fn test_entry_stale_after_ttl() {
        let entry = CacheEntry::new(1, at(0));
        assert!(entry.is_stale(at(3601), Duration::from_secs(3600)));
    }

    #[test]
    fn test_entry_clock_backwards_is_fresh() {
        let entry = CacheEntry::new(1, at(100));
        assert!(!entry.is_stale(at(0), Duration::from_secs(10)));
    }

    #[test]
    fn test_empty_cache_is_stale() {
        let cache: TimedCache<u32> = TimedCache::new(Duration::from_secs(60));
        assert!(cache.is_stale(at(0)));
        assert_eq!(cache.get_fresh(at(0)), None);
    }

    #[test]
    fn test_store_then_expire() {
        let mut cache = TimedCache::new(Duration::from_secs(60));
        assert_eq!(cache.store("catalog", at(0)), "catalog");
        assert_eq!(cache.get_fresh(at(30)), Some("catalog"));
        assert!(!cache.is_stale(at(60)));
        assert_eq!(cache.get_fresh(at(61)), None);
        assert!(cache.is_stale(at(61)));
    }

    #[test]
    fn test_invalidate_clears_entry() {
        let mut cache = TimedCache::new(Duration::from_secs(60));
        cache.store(7, at(0));
        cache.invalidate();
        assert!(cache.is_stale(at(1)));
        assert_eq!(cache.get_fresh(at(1)), None);
    }
}
