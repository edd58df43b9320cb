// =============================================================================
// Expiring memoization cache
// =============================================================================
//
// Analysis results are memoized per (ticker, date range) for a fixed TTL.
// An entry older than the TTL reads as absent. Every insert first drops all
// expired entries, so the map only ever holds keys seen within one TTL.
// =============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::RwLock;

/// Cache key for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }
}

/// Thread-safe key → value store whose entries expire after `ttl`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    /// Store `value`, replacing any previous entry and restarting its TTL.
    /// Expired entries under other keys are evicted on the way.
    pub fn insert(&self, key: K, value: V) {
        self.purge_expired();
        self.entries.write().insert(key, (Instant::now(), value));
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
