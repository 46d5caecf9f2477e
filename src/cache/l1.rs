//! L1: the bounded, in-process hot map. No expiry; eviction is purely
//! size-triggered.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

struct Entry {
    value: Vec<u8>,
    last_access_nanos: u64,
    access_count: u64,
}

/// The L1 hot map: `id -> {value, last-access-nanos, access-count}`, guarded
/// by a single-writer/many-readers lock.
pub struct L1 {
    map: RwLock<HashMap<String, Entry>>,
    clock: Instant,
}

impl Default for L1 {
    fn default() -> Self {
        Self::new()
    }
}

impl L1 {
    /// Creates an empty L1 map.
    #[must_use]
    pub fn new() -> Self {
        Self { map: RwLock::new(HashMap::new()), clock: Instant::now() }
    }

    fn now_nanos(&self) -> u64 {
        self.clock.elapsed().as_nanos() as u64
    }

    /// Looks up `key`, bumping its access metadata on hit.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.now_nanos();
        let map = self.map.read();
        let entry = map.get(key)?;
        let value = entry.value.clone();
        drop(map);
        let mut map = self.map.write();
        if let Some(entry) = map.get_mut(key) {
            entry.last_access_nanos = now;
            entry.access_count += 1;
        }
        Some(value)
    }

    /// Inserts or overwrites `key`, evicting if this pushes the map at or
    /// above `max_size * eviction_threshold`. Returns the number of entries
    /// evicted.
    pub fn put(&self, key: String, value: Vec<u8>, max_size: usize, eviction_threshold: f64) -> usize {
        let now = self.now_nanos();
        let mut map = self.map.write();
        map.insert(key, Entry { value, last_access_nanos: now, access_count: 0 });
        let trigger = (max_size as f64 * eviction_threshold) as usize;
        if map.len() >= trigger.max(1) {
            evict_oldest_20_percent(&mut map)
        } else {
            0
        }
    }

    /// Removes `key`, if present.
    pub fn remove(&self, key: &str) {
        self.map.write().remove(key);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.map.write().clear();
    }

    /// Current entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

fn evict_oldest_20_percent(map: &mut HashMap<String, Entry>) -> usize {
    let evict_count = (map.len() as f64 * 0.2).ceil() as usize;
    if evict_count == 0 {
        return 0;
    }
    let mut keys: Vec<(String, u64, u64)> = map
        .iter()
        .map(|(k, e)| (k.clone(), e.last_access_nanos, e.access_count))
        .collect();
    keys.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)));
    let mut evicted = 0;
    for (key, _, _) in keys.into_iter().take(evict_count) {
        map.remove(&key);
        evicted += 1;
    }
    evicted
}

/// Hit/miss/eviction counters, shared across the tiered cache's read path
/// for the tuning controller's inputs.
#[derive(Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    /// Records a cache hit (any tier).
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a full miss (all tiers).
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an L1 eviction.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of `(hits, misses, evictions)`.
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
        )
    }
}
