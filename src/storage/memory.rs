//! In-process storage backend, backed by a lock-guarded map. Used for tests,
//! ephemeral sessions, and as the cache's own building block.

use super::{ListEntry, StorageBackend, StorageError, UsageEstimate};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A backend that keeps everything in a `HashMap`. Nothing persists across
/// process restarts.
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<(), StorageError> {
        self.data.write().insert(key.to_string(), blob);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError> {
        Ok(self
            .data
            .read()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| ListEntry {
                id: k[prefix.len()..].to_string(),
                size: v.len() as u64,
            })
            .collect())
    }

    async fn estimate_usage(&self) -> Result<UsageEstimate, StorageError> {
        let data = self.data.read();
        let used_bytes = data.values().map(|v| v.len() as u64).sum();
        Ok(UsageEstimate {
            used_bytes,
            quota_bytes: None,
            details: format!("{} keys in memory", data.len()),
        })
    }
}
