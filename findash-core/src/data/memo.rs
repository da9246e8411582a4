//! In-memory memoization keyed by typed fetch keys.
//!
//! Values are stored as computed. When `V` is a `Result`, failures are
//! memoized exactly like successes until cleared or stale.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Memo map with an optional time-to-live.
///
/// Without a TTL, entries live until invalidated. With one, an entry older
/// than the TTL is recomputed on its next lookup.
pub struct MemoCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Option<Duration>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        self.ttl.map_or(true, |ttl| entry.stored_at.elapsed() < ttl)
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| self.is_fresh(e))
            .map(|e| e.value.clone())
    }

    /// Return the memoized value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without holding the lock. If another caller stored a
    /// fresh value meanwhile, that value wins.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            tracing::debug!(?key, "memo hit");
            return value;
        }

        tracing::debug!(?key, "memo miss");
        let value = compute();

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key).filter(|e| self.is_fresh(e)) {
            return existing.value.clone();
        }
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Drop one entry. Returns true if it existed.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).is_some()
    }

    /// Drop every entry whose key matches. Returns how many were removed.
    pub fn invalidate_where(&self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|k, _| !pred(k));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
