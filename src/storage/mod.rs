//! Pluggable storage backends behind one capability contract
//! (`put`/`get`/`delete`/`list`/`estimate_usage`), plus the namespacing,
//! pagination, and statistics layers built on top of it.

pub mod adapter;
pub mod local_fs;
pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod opfs;
#[cfg(feature = "s3")]
pub mod s3;
pub mod statistics;

pub use adapter::{Page, Pagination, StorageAdapter};
pub use local_fs::LocalFsBackend;
pub use memory::MemoryBackend;
pub use statistics::StatisticsAccumulator;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A logical namespace a key lives in. Namespaced as `nouns/`, `verbs/`,
/// `metadata/`, `index/` on every backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `nouns/`
    Nouns,
    /// `verbs/`
    Verbs,
    /// `metadata/`
    Metadata,
    /// `index/`
    Index,
}

impl Namespace {
    /// The on-disk/key prefix, without a trailing id.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Nouns => "nouns/",
            Self::Verbs => "verbs/",
            Self::Metadata => "metadata/",
            Self::Index => "index/",
        }
    }
}

/// The error kinds a storage backend reports, per the failure-semantics
/// contract: `not-found` is not an error for `get`/`delete`, `transient` is
/// retried by the adapter, everything else surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Key not present (not surfaced as an error from `get`/`delete`).
    NotFound,
    /// Authentication/authorization failure.
    Auth,
    /// Backend quota exhausted.
    QuotaExceeded,
    /// Transient failure eligible for retry.
    Transient,
    /// Stored bytes failed to parse/deserialize.
    Malformed,
    /// Backend-specific failure with no better classification.
    BackendSpecific,
}

/// A structured storage error.
#[derive(Debug, Error, Clone)]
#[error("storage error ({kind:?}): {message}")]
pub struct StorageError {
    /// The error's kind.
    pub kind: StorageErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl StorageError {
    /// Builds a new error of `kind` with `message`.
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Shorthand for [`StorageErrorKind::NotFound`].
    #[must_use]
    pub fn not_found(key: &str) -> Self {
        Self::new(StorageErrorKind::NotFound, format!("key not found: {key}"))
    }

    /// True if the adapter should retry this error with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == StorageErrorKind::Transient
    }
}

/// A `(id, size_in_bytes)` entry returned by `list`.
#[derive(Debug, Clone)]
pub struct ListEntry {
    /// The entity id (key with its namespace prefix stripped).
    pub id: String,
    /// Size of the stored blob, in bytes.
    pub size: u64,
}

/// Usage estimate returned by `estimate_usage`.
#[derive(Debug, Clone, Default)]
pub struct UsageEstimate {
    /// Bytes currently used.
    pub used_bytes: u64,
    /// Total quota, if the backend can report one.
    pub quota_bytes: Option<u64>,
    /// Free-form backend-specific detail (e.g. bucket name, root path).
    pub details: String,
}

/// The capability contract every storage backend implements: atomic
/// overwrite-put, get-or-none, idempotent delete, restartable list, and a
/// usage estimate. Implementations are responsible only for raw key/blob
/// storage — namespacing, pagination, and retry live in [`StorageAdapter`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Atomically overwrites `key` with `blob`.
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<(), StorageError>;

    /// Returns the blob at `key`, or `Ok(None)` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Deletes `key`. Missing key is success.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Lists all keys under `prefix`, most-recently-unspecified order. The
    /// adapter bounds how many entries it consumes; backends should support
    /// resuming from wherever they left off on repeated calls during a
    /// single bounded scan, but need not support stable cross-call cursors.
    async fn list(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError>;

    /// Estimates total usage for this backend.
    async fn estimate_usage(&self) -> Result<UsageEstimate, StorageError>;
}

/// Retries `op` up to 3 attempts total on [`StorageErrorKind::Transient`],
/// with capped exponential backoff: 100ms base, 2x growth, ±25% jitter.
/// Every other error kind (and the final transient failure) is returned
/// immediately.
pub(crate) async fn retry_transient<F, Fut, T>(mut op: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StorageError>>,
{
    const MAX_ATTEMPTS: u32 = 3;
    const BASE_MS: u64 = 100;

    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                let backoff_ms = BASE_MS * 2u64.pow(attempt - 1);
                let jitter = jitter_fraction(attempt);
                let wait_ms = (backoff_ms as f64 * (1.0 + jitter)) as u64;
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Deterministic pseudo-jitter in `[-0.25, 0.25]`, derived from the attempt
/// number so retries don't need a seeded RNG threaded through every backend.
fn jitter_fraction(attempt: u32) -> f64 {
    let x = f64::from(attempt) * 0.618_033_988_75;
    (x.fract() - 0.5) * 0.5
}
