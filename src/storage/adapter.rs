//! Translates the domain model (nouns, verbs, metadata) into namespaced
//! keyed blobs over a [`StorageBackend`], and implements pagination and
//! type-indexed listing on top of the raw `{put,get,delete,list}` contract.

use super::{retry_transient, Namespace, StorageBackend, StorageError, StorageErrorKind};
use crate::model::{Id, Metadata, Noun, Verb};
use std::sync::Arc;

/// A page request: `offset`/`limit` drive the bounded-fallback path;
/// `cursor`, when present, is the id to resume after (used by the
/// type-indexed fast path, which has no stable numeric offset).
#[derive(Clone, Debug, Default)]
pub struct Pagination {
    /// Zero-based start offset. Defaults to 0.
    pub offset: Option<usize>,
    /// Page size. Callers should default this to 100.
    pub limit: usize,
    /// Resume-after cursor from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

impl Pagination {
    /// A page of `limit` items starting at `offset`.
    #[must_use]
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset: Some(offset), limit, cursor: None }
    }
}

/// A page of results.
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total matching count, when the fast path could determine it cheaply.
    pub total_count: Option<u64>,
    /// True if more items exist beyond this page.
    pub has_more: bool,
    /// Opaque cursor for the next page, if `has_more`.
    pub next_cursor: Option<String>,
}

/// Filter over `listNouns`. Only `noun_type` participates in the
/// type-indexed fast path; anything else falls back to a bounded scan.
#[derive(Clone, Debug, Default)]
pub struct NounFilter {
    /// Restrict to nouns tagged with this type.
    pub noun_type: Option<String>,
}

/// Filter over `listVerbs`. A filter naming exactly one of `verb_type`,
/// `source_id`, or `target_id` (and nothing else) takes the fast path.
#[derive(Clone, Debug, Default)]
pub struct VerbFilter {
    /// Restrict to verbs of this type.
    pub verb_type: Option<String>,
    /// Restrict to verbs originating at this noun.
    pub source_id: Option<Id>,
    /// Restrict to verbs terminating at this noun.
    pub target_id: Option<Id>,
}

impl VerbFilter {
    fn single_index(&self) -> Option<String> {
        let set = [self.verb_type.is_some(), self.source_id.is_some(), self.target_id.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        if set != 1 {
            return None;
        }
        if let Some(t) = &self.verb_type {
            return Some(format!("index/verbs_by_type/{t}/"));
        }
        if let Some(s) = &self.source_id {
            return Some(format!("index/verbs_by_source/{s}/"));
        }
        self.target_id.as_ref().map(|t| format!("index/verbs_by_target/{t}/"))
    }
}

/// When a bounded (non-indexed) scan is used, read at most
/// `10 * (offset + limit + 1)` entries before truncating.
fn bounded_read_cap(pagination: &Pagination) -> usize {
    10 * (pagination.offset.unwrap_or(0) + pagination.limit.max(1) + 1)
}

/// Namespacing, pagination, and type-indexed listing over a
/// [`StorageBackend`]. Cheap to clone (wraps an `Arc`).
#[derive(Clone)]
pub struct StorageAdapter<B: StorageBackend> {
    backend: Arc<B>,
}

impl<B: StorageBackend> StorageAdapter<B> {
    /// Wraps `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    fn key(ns: Namespace, id: &str) -> String {
        format!("{}{id}", ns.prefix())
    }

    async fn put_json<T: serde::Serialize + ?Sized>(&self, ns: Namespace, id: &str, value: &T) -> Result<(), StorageError> {
        let blob = serde_json::to_vec(value)
            .map_err(|e| StorageError::new(StorageErrorKind::Malformed, e.to_string()))?;
        let key = Self::key(ns, id);
        retry_transient(|| self.backend.put(&key, blob.clone())).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, ns: Namespace, id: &str) -> Result<Option<T>, StorageError> {
        let key = Self::key(ns, id);
        let Some(bytes) = retry_transient(|| self.backend.get(&key)).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::new(StorageErrorKind::Malformed, e.to_string()))
    }

    /// Stores `noun` under the flat `nouns/` namespace.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn put_noun(&self, noun: &Noun) -> Result<(), StorageError> {
        self.put_json(Namespace::Nouns, &noun.id.0, noun).await
    }

    /// Fetches a noun by id, tolerant of the legacy per-type-subdirectory
    /// layout (`nouns/<type>/<id>`) if the flat read misses.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn get_noun(&self, id: &Id) -> Result<Option<Noun>, StorageError> {
        if let Some(noun) = self.get_json::<Noun>(Namespace::Nouns, &id.0).await? {
            return Ok(Some(noun));
        }
        // Legacy read-tolerance: some backends historically sharded nouns
        // into `nouns/<type>/<id>`. Scan the namespace for a matching
        // suffix rather than guessing the type.
        let entries = retry_transient(|| self.backend.list(Namespace::Nouns.prefix())).await?;
        let Some(entry) = entries.into_iter().find(|e| e.id.ends_with(&format!("/{}", id.0))) else {
            return Ok(None);
        };
        let key = format!("{}{}", Namespace::Nouns.prefix(), entry.id);
        let Some(bytes) = retry_transient(|| self.backend.get(&key)).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::new(StorageErrorKind::Malformed, e.to_string()))
    }

    /// Deletes a noun. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn delete_noun(&self, id: &Id) -> Result<(), StorageError> {
        let key = Self::key(Namespace::Nouns, &id.0);
        retry_transient(|| self.backend.delete(&key)).await
    }

    /// Stores `metadata` for `id`. If it carries a `noun` type tag, also
    /// writes the secondary type index entry the fast listing path reads.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn put_metadata(&self, id: &Id, metadata: &Metadata) -> Result<(), StorageError> {
        self.put_json(Namespace::Metadata, &id.0, metadata).await?;
        if let Some(noun_type) = crate::model::noun_type(metadata) {
            let marker = format!("index/nouns_by_type/{noun_type}/{}", id.0);
            retry_transient(|| self.backend.put(&marker, Vec::new())).await?;
        }
        Ok(())
    }

    /// Fetches metadata for `id`, if present.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn get_metadata(&self, id: &Id) -> Result<Option<Metadata>, StorageError> {
        self.get_json(Namespace::Metadata, &id.0).await
    }

    /// Deletes metadata for `id` and any type-index marker it registered.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn delete_metadata(&self, id: &Id) -> Result<(), StorageError> {
        if let Some(metadata) = self.get_metadata(id).await? {
            if let Some(noun_type) = crate::model::noun_type(&metadata) {
                let marker = format!("index/nouns_by_type/{noun_type}/{}", id.0);
                retry_transient(|| self.backend.delete(&marker)).await?;
            }
        }
        let key = Self::key(Namespace::Metadata, &id.0);
        retry_transient(|| self.backend.delete(&key)).await
    }

    /// Lists nouns matching `filter`, paginated per `pagination`.
    ///
    /// Takes the type-indexed fast path (touching only
    /// `index/nouns_by_type/<type>/`) when `filter.noun_type` is set;
    /// otherwise performs a bounded scan of the flat `nouns/` namespace.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn list_nouns(&self, pagination: &Pagination, filter: &NounFilter) -> Result<Page<Noun>, StorageError> {
        let offset = pagination.offset.unwrap_or(0);
        let limit = pagination.limit.max(1);

        if let Some(noun_type) = &filter.noun_type {
            let prefix = format!("index/nouns_by_type/{noun_type}/");
            let mut entries = retry_transient(|| self.backend.list(&prefix)).await?;
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            let total = entries.len() as u64;
            let window: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();
            let has_more = offset + window.len() < total as usize;
            let next_cursor = window.last().map(|e| e.id.clone());
            let mut items = Vec::with_capacity(window.len());
            for entry in &window {
                if let Some(noun) = self.get_noun(&Id::from(entry.id.clone())).await? {
                    items.push(noun);
                }
            }
            return Ok(Page { items, total_count: Some(total), has_more, next_cursor });
        }

        let cap = bounded_read_cap(pagination);
        let mut entries = retry_transient(|| self.backend.list(Namespace::Nouns.prefix())).await?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let scanned = entries.len();
        let truncated = scanned > cap;
        if truncated {
            log::warn!("listNouns: bounded scan truncated at {cap} entries; results may be incomplete");
            entries.truncate(cap);
        }
        let window: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();
        let has_more = truncated || offset + window.len() < scanned;
        let next_cursor = window.last().map(|e| e.id.clone());
        let mut items = Vec::with_capacity(window.len());
        for entry in &window {
            if let Some(noun) = self.get_json::<Noun>(Namespace::Nouns, &entry.id).await? {
                items.push(noun);
            }
        }
        Ok(Page { items, total_count: None, has_more, next_cursor })
    }

    /// Stores `verb` and its secondary `type`/`source`/`target` index
    /// markers under `verbs/` and `index/verbs_by_*`.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn put_verb(&self, verb: &Verb) -> Result<(), StorageError> {
        self.put_json(Namespace::Verbs, &verb.id.0, verb).await?;
        let type_marker = format!("index/verbs_by_type/{}/{}", verb.verb_type, verb.id.0);
        let source_marker = format!("index/verbs_by_source/{}/{}", verb.source_id.0, verb.id.0);
        let target_marker = format!("index/verbs_by_target/{}/{}", verb.target_id.0, verb.id.0);
        retry_transient(|| self.backend.put(&type_marker, Vec::new())).await?;
        retry_transient(|| self.backend.put(&source_marker, Vec::new())).await?;
        retry_transient(|| self.backend.put(&target_marker, Vec::new())).await?;
        Ok(())
    }

    /// Fetches a verb by id.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn get_verb(&self, id: &Id) -> Result<Option<Verb>, StorageError> {
        self.get_json(Namespace::Verbs, &id.0).await
    }

    /// Deletes a verb and its secondary index markers. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn delete_verb(&self, id: &Id) -> Result<(), StorageError> {
        if let Some(verb) = self.get_verb(id).await? {
            let type_marker = format!("index/verbs_by_type/{}/{}", verb.verb_type, verb.id.0);
            let source_marker = format!("index/verbs_by_source/{}/{}", verb.source_id.0, verb.id.0);
            let target_marker = format!("index/verbs_by_target/{}/{}", verb.target_id.0, verb.id.0);
            retry_transient(|| self.backend.delete(&type_marker)).await?;
            retry_transient(|| self.backend.delete(&source_marker)).await?;
            retry_transient(|| self.backend.delete(&target_marker)).await?;
        }
        let key = Self::key(Namespace::Verbs, &id.0);
        retry_transient(|| self.backend.delete(&key)).await
    }

    /// Lists verbs matching `filter`, paginated per `pagination`. Takes the
    /// type-indexed fast path when exactly one of `verb_type`/`source_id`/
    /// `target_id` is set; otherwise performs a bounded scan of `verbs/`.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn list_verbs(&self, pagination: &Pagination, filter: &VerbFilter) -> Result<Page<Verb>, StorageError> {
        let offset = pagination.offset.unwrap_or(0);
        let limit = pagination.limit.max(1);

        if let Some(prefix) = filter.single_index() {
            let mut entries = retry_transient(|| self.backend.list(&prefix)).await?;
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            let total = entries.len() as u64;
            let window: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();
            let has_more = offset + window.len() < total as usize;
            let next_cursor = window.last().map(|e| e.id.clone());
            let mut items = Vec::with_capacity(window.len());
            for entry in &window {
                if let Some(verb) = self.get_verb(&Id::from(entry.id.clone())).await? {
                    items.push(verb);
                }
            }
            return Ok(Page { items, total_count: Some(total), has_more, next_cursor });
        }

        let cap = bounded_read_cap(pagination);
        let mut entries = retry_transient(|| self.backend.list(Namespace::Verbs.prefix())).await?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let scanned = entries.len();
        let truncated = scanned > cap;
        if truncated {
            log::warn!("listVerbs: bounded scan truncated at {cap} entries; results may be incomplete");
            entries.truncate(cap);
        }
        let window: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();
        let has_more = truncated || offset + window.len() < scanned;
        let next_cursor = window.last().map(|e| e.id.clone());
        let mut items = Vec::with_capacity(window.len());
        for entry in &window {
            if let Some(verb) = self.get_json::<Verb>(Namespace::Verbs, &entry.id).await? {
                items.push(verb);
            }
        }
        Ok(Page { items, total_count: None, has_more, next_cursor })
    }

    /// Estimates total usage for the underlying backend.
    ///
    /// # Errors
    ///
    /// Propagates non-transient [`StorageError`]s from the backend.
    pub async fn estimate_usage(&self) -> Result<super::UsageEstimate, StorageError> {
        retry_transient(|| self.backend.estimate_usage()).await
    }

    /// The raw backend, for modules (statistics, cache L3) that need direct
    /// key access without the domain-model framing.
    #[must_use]
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }
}
