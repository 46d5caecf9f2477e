//! Filesystem-backed storage: one file per key under a root directory,
//! written via temp-file-then-rename for atomic `put`.

use super::{ListEntry, StorageBackend, StorageError, StorageErrorKind, UsageEstimate};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Stores each key as a file at `root/<key>`, creating parent directories on
/// demand. `list` walks the directory tree recursively under the prefix so
/// legacy per-type subdirectory layouts (`nouns/<type>/<id>`) are still
/// enumerated alongside the current flat layout (`nouns/<id>`).
pub struct LocalFsBackend {
    root: PathBuf,
}

impl LocalFsBackend {
    /// Creates a backend rooted at `root`, creating the directory if absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if `root` can't be created.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&e))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn io_error(e: &std::io::Error) -> StorageError {
    let kind = match e.kind() {
        std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => StorageErrorKind::Auth,
        std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock => StorageErrorKind::Transient,
        _ => StorageErrorKind::BackendSpecific,
    };
    StorageError::new(kind, e.to_string())
}

#[async_trait]
impl StorageBackend for LocalFsBackend {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| io_error(&e))?;
        }
        let tmp = path.with_extension(format!(
            "tmp-{}",
            std::process::id()
        ));
        tokio::fs::write(&tmp, &blob).await.map_err(|e| io_error(&e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| io_error(&e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError> {
        let dir = self.path_for(prefix);
        walk(&dir).await.map_err(|e| io_error(&e))
    }

    async fn estimate_usage(&self) -> Result<UsageEstimate, StorageError> {
        let out = walk(&self.root).await.map_err(|e| io_error(&e))?;
        let used_bytes = out.iter().map(|e| e.size).sum();
        Ok(UsageEstimate {
            used_bytes,
            quota_bytes: None,
            details: format!("root={}", self.root.display()),
        })
    }
}

/// Iteratively walks every file under `base`, returning ids relative to
/// `base` with path separators normalized to `/`. Avoids async recursion
/// (an `async fn` can't call itself without boxing) with an explicit stack.
async fn walk(base: &Path) -> std::io::Result<Vec<ListEntry>> {
    let mut out = Vec::new();
    let mut stack = vec![base.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()).map(|e| e.starts_with("tmp-")) != Some(true) {
                let id = path
                    .strip_prefix(base)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace(std::path::MAIN_SEPARATOR, "/");
                out.push(ListEntry { id, size: meta.len() });
            }
        }
    }
    Ok(out)
}
