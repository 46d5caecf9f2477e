//! Hierarchical navigable small-world index: insertion, k-nearest search, and
//! deletion over an arena-backed graph of [`crate::model::Noun`] vectors.

pub mod config;
pub mod delete;
pub mod graph;
pub mod insert;
pub mod neighbor;
pub mod search;

pub use config::HnswConfig;
pub use graph::{GraphError, HnswGraph, Node, NodeId};
pub use search::Candidate;

use crate::model::Id;
use search::{greedy_descend, search_layer};

/// One scored result from [`HnswIndex::search`].
#[derive(Clone, Debug)]
pub struct SearchHit {
    /// The matched noun's id.
    pub id: Id,
    /// Distance under the index's configured metric (lower is closer).
    pub distance: f32,
}

/// The public HNSW index: owns the graph and exposes insert/search/delete.
pub struct HnswIndex {
    graph: HnswGraph,
}

impl HnswIndex {
    /// Creates an empty index from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: HnswConfig) -> Result<Self, GraphError> {
        Ok(Self { graph: HnswGraph::new(config)? })
    }

    /// Number of nouns ever inserted, including tombstoned ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// True if the index has no nouns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Live (non-deleted) noun count.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.graph.live_len()
    }

    /// The configuration this index was built with.
    #[must_use]
    pub fn config(&self) -> &HnswConfig {
        &self.graph.config
    }

    /// Inserts `vector` under `id`.
    ///
    /// # Errors
    ///
    /// See [`insert::insert`].
    pub fn insert(&mut self, id: Id, vector: Vec<f32>) -> Result<(), GraphError> {
        insert::insert(&mut self.graph, id, vector)
    }

    /// Removes `id` from the index, repairing neighbor lists around it.
    ///
    /// # Errors
    ///
    /// See [`delete::delete`].
    pub fn delete(&mut self, id: &Id) -> Result<(), GraphError> {
        delete::delete(&mut self.graph, id)
    }

    /// Returns up to `k` nearest neighbors of `query`, filtered by `admit`
    /// (a predicate over candidate ids; candidates it rejects are still
    /// traversed through but excluded from the result set, so filtering
    /// never shrinks graph reachability).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DimensionMismatch`] if `query`'s length doesn't
    /// match the index.
    pub fn search(&self, query: &[f32], k: usize, ef: Option<usize>, admit: &dyn Fn(&Id) -> bool) -> Result<Vec<SearchHit>, GraphError> {
        self.graph.validate_dim(query)?;
        let Some(entry) = self.graph.entry_point() else {
            return Ok(Vec::new());
        };

        let top_level = self.graph.node(entry).max_level();
        let cur = greedy_descend(&self.graph, query, entry, top_level, 0);

        let ef = ef.unwrap_or(self.graph.config.ef_search as usize).max(k);
        let skip = |n: NodeId| {
            let node = self.graph.node(n);
            !admit(&node.id)
        };
        let found = search_layer(&self.graph, query, &[cur], ef, 0, &skip);

        Ok(found
            .into_iter()
            .take(k)
            .map(|c| SearchHit {
                id: self.graph.node(c.node).id.clone(),
                distance: c.distance,
            })
            .collect())
    }

    /// Resolves a vector by id, if present and not deleted.
    #[must_use]
    pub fn vector(&self, id: &Id) -> Option<&[f32]> {
        self.graph.vector(id)
    }

    /// True if `id` is present and not deleted.
    #[must_use]
    pub fn contains(&self, id: &Id) -> bool {
        self.graph.vector(id).is_some()
    }
}
