//
// cache.rs
//
// Concurrent memoization store with compute-at-most-once semantics per key
//

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::Serialize;

/// Hit/miss counters of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub resets: u64,
    pub entries: usize,
}

/// Key/value memoization supplied by the host.
///
/// `get_or_compute` must run `compute` at most once per key while the entry
/// lives; concurrent callers for the same key wait for and share that value.
pub trait MemoStore<K, V>: Send + Sync {
    fn get_or_compute(&self, key: K, compute: &mut dyn FnMut() -> V) -> V;

    fn get(&self, key: &K) -> Option<V>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}

/// Default [`MemoStore`]: a sharded map of once-cells.
///
/// The shard lock is only held long enough to fetch or insert the cell, so
/// computation for one key never blocks unrelated keys. When the entry count
/// reaches `capacity` the map is cleared.
pub struct MemoCache<K, V> {
    map: DashMap<K, Arc<OnceLock<V>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    resets: AtomicU64,
}

impl<K, V> std::fmt::Debug for MemoCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.map.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            map: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn cell(&self, key: K) -> Arc<OnceLock<V>> {
        if let Some(cell) = self.map.get(&key) {
            return Arc::clone(cell.value());
        }
        if self.map.len() >= self.capacity {
            log::debug!(
                "Memo cache reached capacity {}; clearing {} entries",
                self.capacity,
                self.map.len()
            );
            self.map.clear();
            self.resets.fetch_add(1, Ordering::Relaxed);
        }
        Arc::clone(self.map.entry(key).or_default().value())
    }
}

impl<K, V> MemoStore<K, V> for MemoCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get_or_compute(&self, key: K, compute: &mut dyn FnMut() -> V) -> V {
        let cell = self.cell(key);
        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value.clone();
        }
        let mut computed = false;
        let value = cell
            .get_or_init(|| {
                computed = true;
                compute()
            })
            .clone();
        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    fn get(&self, key: &K) -> Option<V> {
        let cell = Arc::clone(self.map.get(key)?.value());
        cell.get().cloned()
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            entries: self.map.len(),
        }
    }
}
