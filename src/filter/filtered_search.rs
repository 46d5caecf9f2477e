//! Wires the filter subsystem (AST, evaluator, strategy selection) into a
//! live [`HnswIndex`] and [`StorageAdapter`]: given a query vector and a
//! filter expression, picks pre/post/hybrid filtering per
//! [`strategy::select_strategy`] and returns the matching nouns.

use super::ast::FilterExpr;
use super::error::FilterError;
use super::evaluator::evaluate;
use super::parser::parse;
use super::strategy::{self, FilterStrategy, MetadataStore, SELECTIVITY_SAMPLE_SIZE};
use crate::hnsw::{GraphError, HnswIndex, SearchHit};
use crate::model::{Id, Metadata};
use crate::storage::adapter::{NounFilter, Pagination, StorageAdapter};
use crate::storage::{StorageBackend, StorageError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from a filtered search.
#[derive(Debug, Error)]
pub enum FilteredSearchError {
    /// The filter expression failed to parse or evaluate.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// The HNSW search itself failed (e.g. dimension mismatch).
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A storage call failed while fetching metadata for filtering.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The outcome of a filtered search, including which strategy ran so
/// callers/tests can assert on it.
#[derive(Debug)]
pub struct FilteredSearchResult {
    /// Matching hits, nearest first, truncated to the requested `k`.
    pub hits: Vec<SearchHit>,
    /// The strategy actually used (after `Auto` resolves to a concrete one).
    pub strategy_used: FilterStrategy,
    /// Number of HNSW candidates examined before filtering/truncation.
    pub candidates_examined: usize,
}

/// A fixed sample of `(id, metadata)` pairs used for selectivity estimation,
/// addressed positionally to satisfy [`MetadataStore`]'s `usize`-indexed
/// contract without coupling it to the domain model's string ids.
struct Sample {
    entries: Vec<(Id, Option<Metadata>)>,
}

impl MetadataStore for Sample {
    fn get_metadata(&self, id: usize) -> Option<&HashMap<String, crate::model::MetadataValue>> {
        self.entries.get(id).and_then(|(_, m)| m.as_ref())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Searches `index` for `k` nearest neighbors of `query` matching
/// `filter_src` (a filter expression string), choosing a filtering strategy
/// per `requested` (pass [`FilterStrategy::Auto`] to let selectivity
/// estimation decide).
///
/// # Errors
///
/// Returns [`FilteredSearchError::Filter`] if `filter_src` fails to parse,
/// [`FilteredSearchError::Graph`] if `query`'s dimension doesn't match the
/// index, or [`FilteredSearchError::Storage`] if metadata reads fail.
pub async fn search_filtered<B: StorageBackend>(
    index: &HnswIndex,
    storage: &StorageAdapter<B>,
    query: &[f32],
    k: usize,
    filter_src: &str,
    requested: FilterStrategy,
) -> Result<FilteredSearchResult, FilteredSearchError> {
    let expr = parse(filter_src)?;
    let strategy = resolve_strategy(requested, storage, &expr).await?;

    match strategy {
        FilterStrategy::PreFilter => pre_filter(index, storage, query, k, &expr, strategy).await,
        FilterStrategy::PostFilter { oversample } => {
            post_filter(index, storage, query, k, &expr, oversample, strategy).await
        }
        FilterStrategy::Hybrid { oversample_max, .. } => {
            post_filter(index, storage, query, k, &expr, oversample_max, strategy).await
        }
        FilterStrategy::Auto => unreachable!("resolve_strategy never returns Auto"),
    }
}

async fn resolve_strategy<B: StorageBackend>(
    requested: FilterStrategy,
    storage: &StorageAdapter<B>,
    expr: &FilterExpr,
) -> Result<FilterStrategy, FilteredSearchError> {
    if !matches!(requested, FilterStrategy::Auto) {
        requested.validate()?;
        return Ok(requested);
    }

    let page = storage
        .list_nouns(&Pagination::new(0, SELECTIVITY_SAMPLE_SIZE), &NounFilter::default())
        .await?;
    let mut entries = Vec::with_capacity(page.items.len());
    for noun in &page.items {
        let metadata = storage.get_metadata(&noun.id).await?;
        entries.push((noun.id.clone(), metadata));
    }
    let sample = Sample { entries };
    let estimate = strategy::estimate_selectivity(expr, &sample, Some(0x5eed));
    Ok(strategy::select_strategy(estimate.selectivity))
}

/// Scans metadata for every passing id, then restricts the HNSW search to
/// that set via the `admit` predicate. Best when most nouns pass.
async fn pre_filter<B: StorageBackend>(
    index: &HnswIndex,
    storage: &StorageAdapter<B>,
    query: &[f32],
    k: usize,
    expr: &FilterExpr,
    strategy_used: FilterStrategy,
) -> Result<FilteredSearchResult, FilteredSearchError> {
    let mut matching = std::collections::HashSet::new();
    let mut offset = 0;
    loop {
        let page = storage.list_nouns(&Pagination::new(offset, 200), &NounFilter::default()).await?;
        for noun in &page.items {
            let metadata = storage.get_metadata(&noun.id).await?.unwrap_or_default();
            if evaluate(expr, &metadata).unwrap_or(false) {
                matching.insert(noun.id.clone());
            }
        }
        offset += page.items.len();
        if !page.has_more || page.items.is_empty() {
            break;
        }
    }
    let candidates_examined = offset;
    let admit = |id: &Id| matching.contains(id);
    let hits = index.search(query, k, None, &admit)?;
    Ok(FilteredSearchResult { hits, strategy_used, candidates_examined })
}

/// Over-fetches `k * oversample` HNSW candidates, then filters by metadata.
/// Best when few nouns pass: avoids a full metadata scan.
async fn post_filter<B: StorageBackend>(
    index: &HnswIndex,
    storage: &StorageAdapter<B>,
    query: &[f32],
    k: usize,
    expr: &FilterExpr,
    oversample: f32,
    strategy_used: FilterStrategy,
) -> Result<FilteredSearchResult, FilteredSearchError> {
    let widened_k = ((k as f32) * oversample).ceil() as usize;
    let ef = Some(widened_k.max(k).min(strategy::EF_CAP));
    let candidates = index.search(query, widened_k.max(k), ef, &|_| true)?;
    let candidates_examined = candidates.len();

    let mut hits = Vec::with_capacity(k);
    for hit in candidates {
        if hits.len() >= k {
            break;
        }
        let metadata = storage.get_metadata(&hit.id).await?.unwrap_or_default();
        if evaluate(expr, &metadata).unwrap_or(false) {
            hits.push(hit);
        }
    }
    Ok(FilteredSearchResult { hits, strategy_used, candidates_examined })
}
