//! S3-compatible object store backend, gated behind the `s3` feature.
//! Works against AWS S3 and any compatible service (MinIO, R2, ...) reachable
//! through a custom endpoint.

use super::{ListEntry, StorageBackend, StorageError, StorageErrorKind, UsageEstimate};
use async_trait::async_trait;
use aws_sdk_s3::Client;

/// Stores each key as one object under `bucket`, optionally prefixed by
/// `key_prefix` (so several logical databases can share one bucket).
pub struct S3Backend {
    client: Client,
    bucket: String,
    key_prefix: String,
}

impl S3Backend {
    /// Builds a client from the ambient AWS config (environment, profile,
    /// or IMDS credentials) targeting `bucket`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if no region can be resolved.
    pub async fn new(bucket: impl Into<String>, key_prefix: impl Into<String>) -> Result<Self, StorageError> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        if config.region().is_none() {
            return Err(StorageError::new(
                StorageErrorKind::BackendSpecific,
                "no AWS region resolved; set AWS_REGION or a profile default",
            ));
        }
        Ok(Self::from_client(Client::new(&config), bucket, key_prefix))
    }

    /// Builds a backend from an already-configured client, e.g. one pointed
    /// at a custom endpoint for an S3-compatible service.
    #[must_use]
    pub fn from_client(client: Client, bucket: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into(), key_prefix: key_prefix.into() }
    }

    fn object_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.key_prefix.trim_end_matches('/'), key)
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(blob.into())
            .send()
            .await
            .map_err(|e| sdk_error(&e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(|e| {
                    StorageError::new(StorageErrorKind::BackendSpecific, e.to_string())
                })?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(sdk_error(&e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| sdk_error(&e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError> {
        let full_prefix = self.object_key(prefix);
        let mut out = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket).prefix(&full_prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }
            let response = request.send().await.map_err(|e| sdk_error(&e))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let id = key.strip_prefix(&full_prefix).unwrap_or(key).trim_start_matches('/');
                out.push(ListEntry { id: id.to_string(), size: object.size().unwrap_or(0).max(0) as u64 });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }
        Ok(out)
    }

    async fn estimate_usage(&self) -> Result<UsageEstimate, StorageError> {
        let entries = self.list("").await?;
        let used_bytes = entries.iter().map(|e| e.size).sum();
        Ok(UsageEstimate {
            used_bytes,
            quota_bytes: None,
            details: format!("bucket={}", self.bucket),
        })
    }
}

fn is_not_found<E>(e: &aws_sdk_s3::error::SdkError<E>) -> bool
where
    E: std::error::Error + 'static,
{
    e.raw_response()
        .map(|r| r.status().as_u16() == 404)
        .unwrap_or(false)
}

fn sdk_error<E>(e: &aws_sdk_s3::error::SdkError<E>) -> StorageError
where
    E: std::error::Error + 'static,
{
    let kind = match e.raw_response().map(|r| r.status().as_u16()) {
        Some(403) => StorageErrorKind::Auth,
        Some(429) | Some(500..=599) => StorageErrorKind::Transient,
        Some(413) => StorageErrorKind::QuotaExceeded,
        _ => StorageErrorKind::BackendSpecific,
    };
    StorageError::new(kind, e.to_string())
}
