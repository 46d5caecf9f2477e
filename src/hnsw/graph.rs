//! The HNSW graph arena.
//!
//! Nodes live in a dense arena indexed by [`NodeId`]; a separate hash map
//! resolves a caller-facing [`Id`] to its `NodeId`. Each node's per-level
//! neighbor list is an independently-locked `Vec<NodeId>`, replaced wholesale
//! (never edited in place) so a concurrent reader never observes a partially
//! written list.

use crate::model::Id;
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use thiserror::Error;

/// Dense arena handle for a node. Stable for the lifetime of the node (never
/// reused, even after a tombstoned node is logically removed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const INVALID: Self = NodeId(u32::MAX);
}

/// Errors from graph-level operations (arena lookups, dimension checks).
/// Insert/search/delete-specific errors layer additional variants on in
/// their own modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The query or inserted vector's dimension doesn't match the index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Actual dimensionality supplied.
        actual: usize,
    },
    /// The id is not present in the graph.
    #[error("unknown id: {0}")]
    UnknownId(Id),
    /// The id already exists in the graph.
    #[error("duplicate id: {0}")]
    DuplicateId(Id),
    /// The configuration was invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// An internal invariant was violated (arena/lock corruption).
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),
}

/// A single arena slot: the vector, id, tombstone flag, and per-level
/// neighbor lists.
pub struct Node {
    /// Caller-facing id.
    pub id: Id,
    /// Embedding.
    pub vector: Vec<f32>,
    /// Logically deleted (kept in the arena so existing `NodeId`s referenced
    /// by other nodes' neighbor lists stay valid until repair completes).
    pub tombstoned: std::sync::atomic::AtomicBool,
    /// One lock-guarded neighbor list per level, `levels[0]` is the base
    /// layer. `levels.len() - 1` is this node's maximum assigned level.
    pub levels: Vec<RwLock<Vec<NodeId>>>,
}

impl Node {
    fn new(id: Id, vector: Vec<f32>, level: usize) -> Self {
        Self {
            id,
            vector,
            tombstoned: std::sync::atomic::AtomicBool::new(false),
            levels: (0..=level).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    /// This node's maximum level.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// True if the node has been tombstoned (pending physical removal).
    #[must_use]
    pub fn is_tombstoned(&self) -> bool {
        self.tombstoned.load(std::sync::atomic::Ordering::Acquire)
    }
}

/// The HNSW graph: an arena of nodes plus the entry point used to start every
/// descent.
pub struct HnswGraph {
    /// Algorithm configuration.
    pub config: crate::hnsw::HnswConfig,
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashMap<Id, NodeId>,
    pub(crate) entry_point: RwLock<Option<NodeId>>,
    pub(crate) rng: parking_lot::Mutex<ChaCha8Rng>,
}

impl HnswGraph {
    /// Creates an empty graph from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: crate::hnsw::HnswConfig) -> Result<Self, GraphError> {
        config.validate().map_err(GraphError::InvalidConfig)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            entry_point: RwLock::new(None),
            rng: parking_lot::Mutex::new(rng),
        })
    }

    /// Number of nodes ever inserted (includes tombstoned nodes not yet
    /// physically compacted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Live (non-tombstoned) node count.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_tombstoned()).count()
    }

    /// Draws a new node's level: `floor(-ln(U) * m_L)`, `U` uniform in `(0, 1]`.
    pub(crate) fn sample_level(&self) -> usize {
        let mut rng = self.rng.lock();
        let u: f64 = rng.gen_range(f64::EPSILON..=1.0);
        (-u.ln() * self.config.level_mult()).floor() as usize
    }

    pub(crate) fn node(&self, n: NodeId) -> &Node {
        &self.nodes[n.0 as usize]
    }

    /// Looks up the arena handle for a caller-facing id.
    #[must_use]
    pub fn handle(&self, id: &Id) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Resolves a caller-facing id to its vector, if present and not
    /// tombstoned.
    #[must_use]
    pub fn vector(&self, id: &Id) -> Option<&[f32]> {
        let n = self.handle(id)?;
        let node = self.node(n);
        if node.is_tombstoned() {
            None
        } else {
            Some(&node.vector)
        }
    }

    /// Current entry point, if the graph is non-empty.
    #[must_use]
    pub fn entry_point(&self) -> Option<NodeId> {
        *self.entry_point.read()
    }

    pub(crate) fn validate_dim(&self, v: &[f32]) -> Result<(), GraphError> {
        let expected = self.config.dimensions as usize;
        if v.len() != expected {
            return Err(GraphError::DimensionMismatch {
                expected,
                actual: v.len(),
            });
        }
        Ok(())
    }

    /// Allocates a fresh arena slot for `id`/`vector` at `level`, without
    /// wiring up any neighbor edges yet. Caller must hold no locks that would
    /// deadlock against later neighbor-list writes.
    pub(crate) fn push_node(&mut self, id: Id, vector: Vec<f32>, level: usize) -> NodeId {
        let handle = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id.clone(), vector, level));
        self.index.insert(id, handle);
        handle
    }

    /// Distance between two already-resident nodes.
    pub(crate) fn dist_nodes(&self, a: NodeId, b: NodeId) -> f32 {
        self.config
            .metric
            .distance(&self.node(a).vector, &self.node(b).vector)
    }

    /// Distance from a query vector to a resident node.
    pub(crate) fn dist_query(&self, q: &[f32], b: NodeId) -> f32 {
        self.config.metric.distance(q, &self.node(b).vector)
    }
}
