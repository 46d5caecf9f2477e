//! In-process statistics counters, coalesced and flushed to storage on a
//! bounded schedule rather than on every update.

use super::{retry_transient, Namespace, StorageBackend, StorageError};
use crate::model::{StatisticKind, Statistics};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Minimum interval between flushes to storage.
pub const MIN_FLUSH: Duration = Duration::from_secs(5);
/// Maximum time an update may wait before being flushed.
pub const MAX_HOLDBACK: Duration = Duration::from_secs(30);

struct Shared<B: StorageBackend> {
    backend: Arc<B>,
    cache: Mutex<Statistics>,
    last_flush: Mutex<Option<std::time::Instant>>,
    flush_count: Mutex<u64>,
    dirty: Notify,
    populated: std::sync::atomic::AtomicBool,
    read_only: bool,
}

/// Coalesces `incrementStatistic`/`decrementStatistic` calls in memory and
/// flushes them to storage under a scheduler that never writes more often
/// than [`MIN_FLUSH`] nor holds an update back longer than [`MAX_HOLDBACK`].
///
/// Every 10th flush also writes the legacy single-key `index/statistics`
/// blob, for callers reading the pre-rolling-key format.
pub struct StatisticsAccumulator<B: StorageBackend> {
    shared: Arc<Shared<B>>,
    flusher: Option<JoinHandle<()>>,
}

impl<B: StorageBackend + 'static> StatisticsAccumulator<B> {
    /// Starts an accumulator backed by `backend`. Spawns the background
    /// flush-scheduler task; call [`Self::shutdown`] to stop it cleanly.
    #[must_use]
    pub fn start(backend: Arc<B>, read_only: bool) -> Self {
        let shared = Arc::new(Shared {
            backend,
            cache: Mutex::new(Statistics::empty()),
            last_flush: Mutex::new(None),
            flush_count: Mutex::new(0),
            dirty: Notify::new(),
            populated: std::sync::atomic::AtomicBool::new(false),
            read_only,
        });
        let task_shared = Arc::clone(&shared);
        let flusher = tokio::spawn(async move {
            flush_loop(task_shared).await;
        });
        Self { shared, flusher: Some(flusher) }
    }

    /// Increments `kind`'s counter for `service` and marks the accumulator
    /// dirty so the scheduler flushes within [`MAX_HOLDBACK`].
    pub fn increment(&self, kind: StatisticKind, service: &str) {
        self.shared.cache.lock().increment(kind, service);
        self.shared.populated.store(true, std::sync::atomic::Ordering::Release);
        self.shared.dirty.notify_one();
    }

    /// Decrements `kind`'s counter for `service`, saturating at zero.
    pub fn decrement(&self, kind: StatisticKind, service: &str) {
        self.shared.cache.lock().decrement(kind, service);
        self.shared.populated.store(true, std::sync::atomic::Ordering::Release);
        self.shared.dirty.notify_one();
    }

    /// Returns the in-memory cache if warm, else falls back to today's
    /// rolling key, then yesterday's, then the legacy key.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn get_statistics(&self) -> Result<Statistics, StorageError> {
        if self.shared.populated.load(std::sync::atomic::Ordering::Acquire) {
            return Ok(self.shared.cache.lock().clone());
        }
        if let Some(stats) = read_rolling_key(&self.shared.backend, Utc::now()).await? {
            return Ok(stats);
        }
        if let Some(stats) = read_rolling_key(&self.shared.backend, Utc::now() - chrono::Duration::days(1)).await? {
            return Ok(stats);
        }
        let legacy = legacy_key();
        if let Some(bytes) = retry_transient(|| self.shared.backend.get(&legacy)).await? {
            if let Ok(stats) = serde_json::from_slice(&bytes) {
                return Ok(stats);
            }
        }
        Ok(Statistics::empty())
    }

    /// Awaits the flush-scheduler task so no pending update is lost, then
    /// stops it.
    pub async fn shutdown(&mut self) {
        if let Some(stats) = Some(self.shared.cache.lock().clone()) {
            let _ = flush_now(&self.shared, &stats).await;
        }
        if let Some(handle) = self.flusher.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

async fn flush_loop<B: StorageBackend + 'static>(shared: Arc<Shared<B>>) {
    loop {
        let wait = next_flush_wait(&shared);
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = shared.dirty.notified() => {
                // Debounce: don't flush immediately on the first dirty
                // notification, just re-evaluate the wait window.
            }
        }
        if shared.read_only {
            continue;
        }
        let since_last = shared
            .last_flush
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or(MAX_HOLDBACK);
        if since_last < MIN_FLUSH {
            continue;
        }
        let snapshot = shared.cache.lock().clone();
        let _ = flush_now(&shared, &snapshot).await;
    }
}

fn next_flush_wait<B: StorageBackend>(shared: &Shared<B>) -> Duration {
    let since_last = shared
        .last_flush
        .lock()
        .map(|t| t.elapsed())
        .unwrap_or(MAX_HOLDBACK);
    if since_last >= MIN_FLUSH {
        Duration::ZERO
    } else {
        (MIN_FLUSH - since_last).min(MAX_HOLDBACK)
    }
}

async fn flush_now<B: StorageBackend>(shared: &Shared<B>, stats: &Statistics) -> Result<(), StorageError> {
    if shared.read_only {
        return Ok(());
    }
    let key = rolling_key(Utc::now());
    let blob = serde_json::to_vec(stats).map_err(|e| {
        StorageError::new(super::StorageErrorKind::Malformed, e.to_string())
    })?;
    retry_transient(|| shared.backend.put(&key, blob.clone())).await?;

    let mut count = shared.flush_count.lock();
    *count += 1;
    if *count % 10 == 0 {
        let legacy = legacy_key();
        let _ = retry_transient(|| shared.backend.put(&legacy, blob.clone())).await;
    }
    drop(count);

    *shared.last_flush.lock() = Some(std::time::Instant::now());
    Ok(())
}

fn rolling_key(now: DateTime<Utc>) -> String {
    format!("{}statistics_{}", Namespace::Index.prefix(), now.format("%Y%m%d"))
}

fn legacy_key() -> String {
    format!("{}statistics", Namespace::Index.prefix())
}

async fn read_rolling_key<B: StorageBackend>(backend: &Arc<B>, day: DateTime<Utc>) -> Result<Option<Statistics>, StorageError> {
    let key = rolling_key(day);
    let Some(bytes) = retry_transient(|| backend.get(&key)).await? else {
        return Ok(None);
    };
    Ok(serde_json::from_slice(&bytes).ok())
}
