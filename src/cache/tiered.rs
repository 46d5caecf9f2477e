//! The three-level cache: L1 hot map in front of an L2/L3 pair that share a
//! storage backend, plus the prefetch path and the self-tuning controller
//! wiring.

use super::l1::{CacheCounters, L1};
use super::tuning::{self, CacheConfig, TuningInputs, TUNE_INTERVAL};
use crate::storage::{retry_transient, StorageBackend, StorageError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WARM_PREFIX: &str = "cache_warm/";

#[derive(serde::Serialize, serde::Deserialize)]
struct WarmEntry {
    expires_at_unix_ms: i64,
    value: Vec<u8>,
}

/// The tiered cache: L1 (owned here) fronting L2/L3 (owned by the shared
/// storage backend). `get`/`put` operate on already-namespaced storage keys
/// (e.g. `nouns/<id>`), so the same cache instance serves nouns, verbs, and
/// metadata alike.
pub struct TieredCache<B: StorageBackend> {
    l1: L1,
    backend: Arc<B>,
    config: RwLock<CacheConfig>,
    counters: CacheCounters,
    last_tune: Mutex<Option<Instant>>,
    clock_epoch_ms: AtomicI64,
}

impl<B: StorageBackend> TieredCache<B> {
    /// Builds a tiered cache over `backend` with the given starting
    /// `config`.
    #[must_use]
    pub fn new(backend: Arc<B>, config: CacheConfig) -> Self {
        Self {
            l1: L1::new(),
            backend,
            config: RwLock::new(config),
            counters: CacheCounters::default(),
            last_tune: Mutex::new(None),
            clock_epoch_ms: AtomicI64::new(0),
        }
    }

    /// The cache's current tunable configuration.
    #[must_use]
    pub fn config(&self) -> CacheConfig {
        *self.config.read()
    }

    /// Hit/miss/eviction counters, for `status()` and the tuning controller.
    #[must_use]
    pub fn counters(&self) -> (u64, u64, u64) {
        self.counters.snapshot()
    }

    /// Runs the self-tuning controller if `tune_interval` has elapsed since
    /// the last pass; a cheap no-op check otherwise. Called before every
    /// `get`/`get_many`/`prefetch`, per the read-path contract.
    pub fn maybe_tune(&self, inputs: &TuningInputs) {
        let mut last = self.last_tune.lock();
        let due = last.map_or(true, |t| t.elapsed() >= TUNE_INTERVAL);
        if !due {
            return;
        }
        let current = self.config();
        let next = tuning::tune(&current, inputs);
        *self.config.write() = next;
        *last = Some(Instant::now());
    }

    /// Read path: L1 -> L2 -> L3, promoting on each tier that missed.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the L3 read.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.l1.get(key) {
            self.counters.record_hit();
            return Ok(Some(value));
        }

        if let Some(value) = self.get_warm(key).await? {
            self.counters.record_hit();
            self.promote_l1(key, &value);
            return Ok(Some(value));
        }

        let value = retry_transient(|| self.backend.get(key)).await?;
        match value {
            Some(value) => {
                self.counters.record_hit();
                self.put_warm(key, &value).await;
                self.promote_l1(key, &value);
                Ok(Some(value))
            }
            None => {
                self.counters.record_miss();
                Ok(None)
            }
        }
    }

    /// Write-through write path: L3 first, then best-effort L2/L1.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the L3 write; L2/L1
    /// failures are logged and swallowed.
    pub async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        retry_transient(|| self.backend.put(key, value.clone())).await?;
        self.put_warm(key, &value).await;
        self.promote_l1(key, &value);
        Ok(())
    }

    /// Invalidates `key` from L1 and L2 (L3 removal is the caller's
    /// responsibility via the storage adapter's delete).
    pub fn invalidate(&self, key: &str) {
        self.l1.remove(key);
        let warm_key = format!("{WARM_PREFIX}{key}");
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let _ = backend.delete(&warm_key).await;
        });
    }

    /// Prefetches `ids`, partitioned into batches of the current
    /// `batch_size` and issued concurrently per batch. Errors are logged,
    /// never surfaced.
    pub async fn prefetch(&self, keys: &[String], inputs: &TuningInputs) {
        self.maybe_tune(inputs);
        let batch_size = self.config().batch_size;
        for batch in keys.chunks(batch_size.max(1)) {
            let gets = batch.iter().map(|key| self.get(key));
            let results = futures_util::future::join_all(gets).await;
            for (key, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    log::warn!("prefetch miss for {key}: {e}");
                }
            }
        }
    }

    fn promote_l1(&self, key: &str, value: &[u8]) {
        let config = self.config();
        let evicted = self
            .l1
            .put(key.to_string(), value.to_vec(), config.max_size, config.eviction_threshold);
        for _ in 0..evicted {
            self.counters.record_eviction();
        }
    }

    async fn get_warm(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let warm_key = format!("{WARM_PREFIX}{key}");
        let Some(bytes) = retry_transient(|| self.backend.get(&warm_key)).await? else {
            return Ok(None);
        };
        let Ok(entry) = serde_json::from_slice::<WarmEntry>(&bytes) else {
            return Ok(None);
        };
        if entry.expires_at_unix_ms <= self.clock_epoch_ms.load(Ordering::Relaxed) {
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn put_warm(&self, key: &str, value: &[u8]) {
        let ttl = self.config().warm_ttl;
        let expires_at_unix_ms = self.clock_epoch_ms.load(Ordering::Relaxed) + duration_as_millis(ttl);
        let entry = WarmEntry { expires_at_unix_ms, value: value.to_vec() };
        let Ok(blob) = serde_json::to_vec(&entry) else { return };
        let warm_key = format!("{WARM_PREFIX}{key}");
        if let Err(e) = retry_transient(|| self.backend.put(&warm_key, blob.clone())).await {
            log::warn!("L2 write for {key} failed (best-effort): {e}");
        }
    }

    /// Advances the cache's internal clock used for L2 TTL expiry. The
    /// cache never calls a wall-clock source directly so its read path stays
    /// deterministic under test.
    pub fn advance_clock(&self, by: Duration) {
        self.clock_epoch_ms.fetch_add(duration_as_millis(by), Ordering::Relaxed);
    }

    /// Drops every L1 entry. L2/L3 are untouched.
    pub fn clear_l1(&self) {
        self.l1.clear();
    }
}

fn duration_as_millis(d: Duration) -> i64 {
    d.as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn cache() -> TieredCache<MemoryBackend> {
        TieredCache::new(Arc::new(MemoryBackend::new()), CacheConfig::default())
    }

    #[tokio::test]
    async fn cold_read_promotes_to_l1_and_l2() {
        let cache = cache();
        cache.backend.put("nouns/x", b"v".to_vec()).await.unwrap();
        let value = cache.get("nouns/x").await.unwrap();
        assert_eq!(value, Some(b"v".to_vec()));
        assert_eq!(cache.l1.get("nouns/x"), Some(b"v".to_vec()));
        assert!(cache.get_warm("nouns/x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn subsequent_read_is_served_from_l1() {
        let cache = cache();
        cache.backend.put("nouns/x", b"v".to_vec()).await.unwrap();
        cache.get("nouns/x").await.unwrap();
        let (hits_before, ..) = cache.counters();
        let value = cache.get("nouns/x").await.unwrap();
        let (hits_after, ..) = cache.counters();
        assert_eq!(value, Some(b"v".to_vec()));
        assert_eq!(hits_after, hits_before + 1);
    }

    #[tokio::test]
    async fn write_through_is_visible_immediately() {
        let cache = cache();
        cache.put("nouns/y", b"z".to_vec()).await.unwrap();
        assert_eq!(cache.backend.get("nouns/y").await.unwrap(), Some(b"z".to_vec()));
        assert_eq!(cache.l1.get("nouns/y"), Some(b"z".to_vec()));
    }

    #[tokio::test]
    async fn warm_entry_expires_after_ttl() {
        let cache = cache();
        cache.put("nouns/x", b"v".to_vec()).await.unwrap();
        cache.clear_l1();
        cache.advance_clock(Duration::from_secs(25 * 3600));
        assert!(cache.get_warm("nouns/x").await.unwrap().is_none());
    }
}
