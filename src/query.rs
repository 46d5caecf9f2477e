//! The query engine: assembles the HNSW indices, the tiered cache, the
//! storage adapter, and the statistics accumulator behind one `Db` type
//! exposing exactly the operations of the external interface — `init`,
//! `insert`, `delete`, `search`, `searchText`, `get`, `findSimilar`,
//! `addVerb`, `deleteVerb`, `listNouns`, `listVerbs`, `status`, `clear`,
//! `shutdown`.

use crate::cache::{CacheConfig, TieredCache};
use crate::error::DbError;
use crate::filter::{search_filtered, FilterStrategy};
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::metric::DistanceKind;
use crate::model::{Id, Metadata, Noun, Statistics, StatisticKind, Verb};
use crate::storage::adapter::{NounFilter, Page, Pagination, VerbFilter};
use crate::storage::{Namespace, StorageAdapter, StorageBackend, StatisticsAccumulator};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// How often the background sweep walks verbs looking for dangling
/// `sourceId`/`targetId` references.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Delegates text-to-vector embedding to an external collaborator supplied
/// at [`Db::init`] time; the embedding model itself stays out of scope.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embeds `text` into a vector matching the index's noun dimensionality.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DbError>;
}

/// Configuration accepted by [`Db::init`]. Unknown fields at the JSON
/// boundary (if a caller deserializes this from persisted config) are
/// rejected per the "dynamic configuration objects" design note.
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Noun vector dimensionality.
    pub dimensions: u32,
    /// Verb vector dimensionality (verbs are independently vectorized).
    pub verb_dimensions: u32,
    /// Distance metric shared by both the noun and verb indices.
    pub metric: DistanceKind,
    /// Starting tiered-cache knobs.
    pub cache: CacheConfig,
    /// Disables every mutating operation (`insert`/`delete`/`addVerb`/
    /// `deleteVerb`/`clear`) and statistics writes when `true`.
    pub read_only: bool,
    /// Service tag statistics are recorded under.
    pub service: String,
    /// Free-form label surfaced by `status()` (e.g. `"memory"`, `"s3"`).
    pub storage_kind: String,
}

impl DbConfig {
    /// A configuration with documented HNSW/cache defaults: cosine metric,
    /// read-write, service `"default"`.
    #[must_use]
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            verb_dimensions: dimensions,
            metric: DistanceKind::Cosine,
            cache: CacheConfig::default(),
            read_only: false,
            service: "default".to_string(),
            storage_kind: "memory".to_string(),
        }
    }

    fn noun_hnsw_config(&self) -> HnswConfig {
        let mut cfg = HnswConfig::new(self.dimensions);
        cfg.metric = self.metric;
        cfg
    }

    fn verb_hnsw_config(&self) -> HnswConfig {
        let mut cfg = HnswConfig::new(self.verb_dimensions);
        cfg.metric = self.metric;
        cfg
    }
}

/// One scored result from `search`/`searchText`/`findSimilar`.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// The matched noun's id.
    pub id: Id,
    /// Distance under the index's configured metric (lower is closer).
    pub distance: f32,
    /// The noun's metadata, if any is stored.
    pub metadata: Option<Metadata>,
}

/// `status()`'s cache sub-readout.
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    /// Total L1/L2 hits since the cache started.
    pub hits: u64,
    /// Total misses since the cache started.
    pub misses: u64,
    /// Total L1 evictions since the cache started.
    pub evictions: u64,
}

/// `status()`'s full readout.
#[derive(Clone, Debug)]
pub struct DbStatus {
    /// Live noun count in the index.
    pub size: usize,
    /// Whether the instance rejects mutations.
    pub read_only: bool,
    /// The configured storage backend label.
    pub storage_type: String,
    /// Cache hit/miss/eviction counters.
    pub cache_stats: CacheStats,
}

/// Runs `fut`, racing it against `deadline` if one was given. On expiry,
/// the future is dropped (cooperative cancellation: any in-flight storage
/// request or lock acquisition inside it is simply abandoned) and the
/// operation reports [`ErrorKind::Cancelled`].
async fn with_deadline<F, T>(deadline: Option<Duration>, fut: F) -> Result<T, DbError>
where
    F: std::future::Future<Output = Result<T, DbError>>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .unwrap_or_else(|_| Err(DbError::cancelled("operation exceeded its deadline"))),
        None => fut.await,
    }
}

fn noun_key(id: &Id) -> String {
    format!("{}{}", Namespace::Nouns.prefix(), id.0)
}

fn verb_key(id: &Id) -> String {
    format!("{}{}", Namespace::Verbs.prefix(), id.0)
}

/// The query engine. Cheap to share via `Arc` across tasks; every mutating
/// method takes only the locks it needs, per the per-node/per-tier locking
/// policy described in the concurrency model.
pub struct Db<B: StorageBackend + 'static> {
    nouns: RwLock<HnswIndex>,
    verbs: RwLock<HnswIndex>,
    storage: StorageAdapter<B>,
    cache: TieredCache<B>,
    stats: StatisticsAccumulator<B>,
    embedder: Option<Arc<dyn TextEmbedder>>,
    config: DbConfig,
    sweep: Option<JoinHandle<()>>,
}

impl<B: StorageBackend + 'static> Db<B> {
    /// Builds a `Db` over `backend`, rehydrating the HNSW indices from
    /// every noun/verb already in storage, and starts the statistics
    /// flusher and the dangling-verb consistency sweep.
    ///
    /// Rehydration re-inserts each stored vector rather than restoring the
    /// persisted `connections` verbatim: the index has no loader for a
    /// pre-built graph, so the same insertion algorithm that built the
    /// graph originally rebuilds it on load, converging to an equivalent
    /// (not necessarily byte-identical) topology.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`] if `config`'s HNSW parameters
    /// don't validate, or propagates a storage failure encountered while
    /// rehydrating.
    pub async fn init(
        config: DbConfig,
        backend: Arc<B>,
        embedder: Option<Arc<dyn TextEmbedder>>,
    ) -> Result<Self, DbError> {
        let noun_cfg = config.noun_hnsw_config();
        let verb_cfg = config.verb_hnsw_config();
        noun_cfg.validate().map_err(DbError::invalid_input)?;
        verb_cfg.validate().map_err(DbError::invalid_input)?;

        let mut nouns = HnswIndex::new(noun_cfg)?;
        let mut verbs = HnswIndex::new(verb_cfg)?;
        let storage = StorageAdapter::new(Arc::clone(&backend));

        let mut offset = 0;
        loop {
            let page = storage.list_nouns(&Pagination::new(offset, 200), &NounFilter::default()).await?;
            for noun in &page.items {
                if let Err(e) = nouns.insert(noun.id.clone(), noun.vector.clone()) {
                    log::warn!("rehydrate: skipping noun {}: {e}", noun.id);
                }
            }
            offset += page.items.len();
            if !page.has_more || page.items.is_empty() {
                break;
            }
        }
        let mut offset = 0;
        loop {
            let page = storage.list_verbs(&Pagination::new(offset, 200), &VerbFilter::default()).await?;
            for verb in &page.items {
                if let Err(e) = verbs.insert(verb.id.clone(), verb.vector.clone()) {
                    log::warn!("rehydrate: skipping verb {}: {e}", verb.id);
                }
            }
            offset += page.items.len();
            if !page.has_more || page.items.is_empty() {
                break;
            }
        }

        let cache = TieredCache::new(Arc::clone(&backend), config.cache);
        let stats = StatisticsAccumulator::start(Arc::clone(&backend), config.read_only);

        let sweep_storage = StorageAdapter::new(Arc::clone(&backend));
        let sweep = tokio::spawn(async move {
            consistency_sweep_loop(sweep_storage).await;
        });

        Ok(Self {
            nouns: RwLock::new(nouns),
            verbs: RwLock::new(verbs),
            storage,
            cache,
            stats,
            embedder,
            config,
            sweep: Some(sweep),
        })
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if self.config.read_only {
            return Err(DbError::readonly("this instance is read-only"));
        }
        Ok(())
    }

    /// Inserts `vector` (with optional `metadata`) as a new noun, returning
    /// its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Readonly`] if the instance is read-only,
    /// [`ErrorKind::InvalidInput`] on a dimension mismatch, or a storage
    /// error (with the in-memory insert rolled back) on a write failure.
    pub async fn insert(
        &self,
        vector: Vec<f32>,
        metadata: Option<Metadata>,
        deadline: Option<Duration>,
    ) -> Result<Id, DbError> {
        self.check_writable()?;
        with_deadline(deadline, async move {
            let id = Id::generate();
            self.nouns.write().await.insert(id.clone(), vector.clone())?;

            let noun = Noun::new(id.clone(), vector);
            if let Err(e) = self.storage.put_noun(&noun).await {
                // Roll back the in-memory insert so a subsequent search
                // behaves as if the insert never happened.
                let _ = self.nouns.write().await.delete(&id);
                return Err(e.into());
            }
            if let Some(metadata) = &metadata {
                if let Err(e) = self.storage.put_metadata(&id, metadata).await {
                    let _ = self.nouns.write().await.delete(&id);
                    let _ = self.storage.delete_noun(&id).await;
                    return Err(e.into());
                }
            }

            self.cache.invalidate(&noun_key(&id));
            self.stats.increment(StatisticKind::Noun, &self.config.service);
            if metadata.is_some() {
                self.stats.increment(StatisticKind::Metadata, &self.config.service);
            }
            Ok(id)
        })
        .await
    }

    /// Removes the noun `id`. Idempotent: deleting a missing id is a
    /// [`ErrorKind::NotFound`] only if it was never indexed; storage-side
    /// cleanup proceeds regardless.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Readonly`] if read-only, or propagates storage
    /// failures.
    pub async fn delete(&self, id: &Id, deadline: Option<Duration>) -> Result<(), DbError> {
        self.check_writable()?;
        with_deadline(deadline, async move {
            self.nouns.write().await.delete(id)?;
            self.storage.delete_noun(id).await?;
            self.storage.delete_metadata(id).await?;
            self.cache.invalidate(&noun_key(id));
            self.stats.decrement(StatisticKind::Noun, &self.config.service);
            Ok(())
        })
        .await
    }

    /// Returns up to `k` nearest neighbors of `vector`, optionally
    /// restricted to nouns matching `filter` (a filter expression string).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`] on a dimension or filter-syntax
    /// error, or propagates storage failures encountered fetching metadata.
    pub async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<Vec<SearchResult>, DbError> {
        with_deadline(deadline, async move {
            let hits = match filter {
                Some(expr) => {
                    let nouns = self.nouns.read().await;
                    search_filtered(&nouns, &self.storage, vector, k, expr, FilterStrategy::Auto).await?.hits
                }
                None => self.nouns.read().await.search(vector, k, None, &|_| true)?,
            };
            self.attach_metadata(hits).await
        })
        .await
    }

    /// Embeds `query` via the configured [`TextEmbedder`], then delegates
    /// to [`Self::search`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`] if no embedder was configured at
    /// `init`, or propagates embedding/search failures.
    pub async fn search_text(
        &self,
        query: &str,
        k: usize,
        filter: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<Vec<SearchResult>, DbError> {
        let embedder = self
            .embedder
            .clone()
            .ok_or_else(|| DbError::invalid_input("searchText requires a TextEmbedder configured at init"))?;
        let vector = embedder.embed(query).await?;
        self.search(&vector, k, filter, deadline).await
    }

    /// Fetches a noun by id, preferring the tiered cache.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn get(&self, id: &Id, deadline: Option<Duration>) -> Result<Option<Noun>, DbError> {
        with_deadline(deadline, async move {
            let key = noun_key(id);
            if let Some(bytes) = self.cache.get(&key).await? {
                if let Ok(noun) = serde_json::from_slice::<Noun>(&bytes) {
                    return Ok(Some(noun));
                }
            }
            let noun = self.storage.get_noun(id).await?;
            if let Some(noun) = &noun {
                if let Ok(blob) = serde_json::to_vec(noun) {
                    let _ = self.cache.put(&key, blob).await;
                }
            }
            Ok(noun)
        })
        .await
    }

    /// Returns up to `k` nearest neighbors of the noun `id`'s own vector.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`] if `id` is not indexed.
    pub async fn find_similar(
        &self,
        id: &Id,
        k: usize,
        deadline: Option<Duration>,
    ) -> Result<Vec<SearchResult>, DbError> {
        with_deadline(deadline, async move {
            let vector = {
                let nouns = self.nouns.read().await;
                nouns.vector(id).map(<[f32]>::to_vec)
            };
            let Some(vector) = vector else {
                return Err(DbError::not_found(format!("no noun with id {id}")));
            };
            // k+1 and drop the first hit: a noun is its own nearest neighbor.
            let nouns = self.nouns.read().await;
            let hits = nouns.search(&vector, k + 1, None, &|other| other != id)?;
            drop(nouns);
            self.attach_metadata(hits.into_iter().take(k).collect()).await
        })
        .await
    }

    async fn attach_metadata(&self, hits: Vec<crate::hnsw::SearchHit>) -> Result<Vec<SearchResult>, DbError> {
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let metadata = self.storage.get_metadata(&hit.id).await?;
            out.push(SearchResult { id: hit.id, distance: hit.distance, metadata });
        }
        Ok(out)
    }

    /// Creates a verb (a typed, vectorized, directed edge) and returns its
    /// generated id. `sourceId`/`targetId` are not validated against the
    /// noun index at write time — dangling references are tolerated and
    /// surfaced only by the background consistency sweep, per the verb
    /// lifecycle invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Readonly`] if read-only, [`ErrorKind::InvalidInput`]
    /// on a vector-dimension mismatch, or propagates storage failures.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_verb(
        &self,
        source_id: Id,
        target_id: Id,
        verb_type: String,
        weight: Option<f32>,
        metadata: Option<Metadata>,
        vector: Vec<f32>,
        deadline: Option<Duration>,
    ) -> Result<Id, DbError> {
        self.check_writable()?;
        with_deadline(deadline, async move {
            let id = Id::generate();
            self.verbs.write().await.insert(id.clone(), vector.clone())?;

            let verb = Verb::new(id.clone(), source_id, target_id, verb_type, weight, vector);
            if let Err(e) = self.storage.put_verb(&verb).await {
                let _ = self.verbs.write().await.delete(&id);
                return Err(e.into());
            }
            if let Some(metadata) = &metadata {
                if let Err(e) = self.storage.put_metadata(&id, metadata).await {
                    let _ = self.verbs.write().await.delete(&id);
                    let _ = self.storage.delete_verb(&id).await;
                    return Err(e.into());
                }
            }

            self.cache.invalidate(&verb_key(&id));
            self.stats.increment(StatisticKind::Verb, &self.config.service);
            if metadata.is_some() {
                self.stats.increment(StatisticKind::Metadata, &self.config.service);
            }
            Ok(id)
        })
        .await
    }

    /// Removes the verb `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Readonly`] if read-only, or propagates storage
    /// failures.
    pub async fn delete_verb(&self, id: &Id, deadline: Option<Duration>) -> Result<(), DbError> {
        self.check_writable()?;
        with_deadline(deadline, async move {
            self.verbs.write().await.delete(id)?;
            self.storage.delete_verb(id).await?;
            self.storage.delete_metadata(id).await?;
            self.cache.invalidate(&verb_key(id));
            self.stats.decrement(StatisticKind::Verb, &self.config.service);
            Ok(())
        })
        .await
    }

    /// Lists nouns matching `filter`, paginated per `pagination`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn list_nouns(
        &self,
        pagination: &Pagination,
        filter: &NounFilter,
        deadline: Option<Duration>,
    ) -> Result<Page<Noun>, DbError> {
        with_deadline(deadline, async move { Ok(self.storage.list_nouns(pagination, filter).await?) }).await
    }

    /// Lists verbs matching `filter`, paginated per `pagination`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn list_verbs(
        &self,
        pagination: &Pagination,
        filter: &VerbFilter,
        deadline: Option<Duration>,
    ) -> Result<Page<Verb>, DbError> {
        with_deadline(deadline, async move { Ok(self.storage.list_verbs(pagination, filter).await?) }).await
    }

    /// Reads the live statistics snapshot.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn get_statistics(&self) -> Result<Statistics, DbError> {
        Ok(self.stats.get_statistics().await?)
    }

    /// Returns `{size, readOnly, storageType, cacheStats}`.
    pub async fn status(&self) -> DbStatus {
        let (hits, misses, evictions) = self.cache.counters();
        DbStatus {
            size: self.nouns.read().await.live_len(),
            read_only: self.config.read_only,
            storage_type: self.config.storage_kind.clone(),
            cache_stats: CacheStats { hits, misses, evictions },
        }
    }

    /// Wipes every noun, verb, and metadata entry from both the index and
    /// storage, and drops the L1 cache. L2/L3 entries are invalidated
    /// lazily as subsequent reads miss.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Readonly`] if read-only, or propagates storage
    /// failures encountered while deleting.
    pub async fn clear(&self, deadline: Option<Duration>) -> Result<(), DbError> {
        self.check_writable()?;
        with_deadline(deadline, async move {
            let noun_ids = self.all_noun_ids().await?;
            for id in &noun_ids {
                self.storage.delete_noun(id).await?;
                self.storage.delete_metadata(id).await?;
            }
            let verb_ids = self.all_verb_ids().await?;
            for id in &verb_ids {
                self.storage.delete_verb(id).await?;
                self.storage.delete_metadata(id).await?;
            }

            let noun_cfg = self.config.noun_hnsw_config();
            let verb_cfg = self.config.verb_hnsw_config();
            *self.nouns.write().await = HnswIndex::new(noun_cfg)?;
            *self.verbs.write().await = HnswIndex::new(verb_cfg)?;
            self.cache.clear_l1();
            Ok(())
        })
        .await
    }

    async fn all_noun_ids(&self) -> Result<Vec<Id>, DbError> {
        let mut ids = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.storage.list_nouns(&Pagination::new(offset, 200), &NounFilter::default()).await?;
            offset += page.items.len();
            let empty = page.items.is_empty();
            ids.extend(page.items.into_iter().map(|n| n.id));
            if !page.has_more || empty {
                break;
            }
        }
        Ok(ids)
    }

    async fn all_verb_ids(&self) -> Result<Vec<Id>, DbError> {
        let mut ids = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.storage.list_verbs(&Pagination::new(offset, 200), &VerbFilter::default()).await?;
            offset += page.items.len();
            let empty = page.items.is_empty();
            ids.extend(page.items.into_iter().map(|v| v.id));
            if !page.has_more || empty {
                break;
            }
        }
        Ok(ids)
    }

    /// Stops the statistics flusher (awaiting its final flush so no update
    /// is lost) and the consistency sweep. Consumes the handle: no further
    /// operations are possible afterward.
    pub async fn shutdown(mut self) -> Result<(), DbError> {
        if let Some(handle) = self.sweep.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.stats.shutdown().await;
        Ok(())
    }
}

async fn consistency_sweep_loop<B: StorageBackend + 'static>(storage: StorageAdapter<B>) {
    loop {
        tokio::time::sleep(SWEEP_INTERVAL).await;
        if let Err(e) = run_consistency_sweep(&storage).await {
            log::warn!("consistency sweep failed: {e}");
        }
    }
}

async fn run_consistency_sweep<B: StorageBackend>(storage: &StorageAdapter<B>) -> Result<(), crate::storage::StorageError> {
    let mut offset = 0;
    let mut dangling = 0usize;
    loop {
        let page = storage.list_verbs(&Pagination::new(offset, 200), &VerbFilter::default()).await?;
        for verb in &page.items {
            let source_missing = storage.get_noun(&verb.source_id).await?.is_none();
            let target_missing = storage.get_noun(&verb.target_id).await?.is_none();
            if source_missing || target_missing {
                dangling += 1;
                log::warn!(
                    "consistency sweep: verb {} has a dangling reference (source missing: {source_missing}, target missing: {target_missing})",
                    verb.id
                );
            }
        }
        offset += page.items.len();
        if !page.has_more || page.items.is_empty() {
            break;
        }
    }
    if dangling > 0 {
        log::warn!("consistency sweep: {dangling} dangling verb(s) found");
    }
    Ok(())
}
