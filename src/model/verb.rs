//! The verb: a typed, directed, independently-vectorized edge between nouns.

use super::noun::{Connections, Id};
use serde::{Deserialize, Serialize};

/// Default edge weight when the caller does not supply one.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// A typed directed edge between two nouns.
///
/// Verbs are themselves vectorized and carry their own HNSW adjacency, so
/// they are independently searchable and rankable. Deleting a noun does not
/// cascade to its verbs — they become dangling and are surfaced only by the
/// background consistency sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verb {
    /// Globally unique id.
    pub id: Id,
    /// Source noun id.
    pub source_id: Id,
    /// Target noun id.
    pub target_id: Id,
    /// Short edge type tag (e.g. `"cites"`, `"follows"`).
    #[serde(rename = "type")]
    pub verb_type: String,
    /// Edge weight, default `1.0`.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Embedding for the edge itself.
    pub vector: Vec<f32>,
    /// Per-level HNSW neighbor lists for the verb's own adjacency.
    #[serde(default)]
    pub connections: Connections,
}

fn default_weight() -> f32 {
    DEFAULT_WEIGHT
}

impl Verb {
    /// Creates a verb with no connections yet (before insertion into the graph).
    #[must_use]
    pub fn new(
        id: Id,
        source_id: Id,
        target_id: Id,
        verb_type: String,
        weight: Option<f32>,
        vector: Vec<f32>,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            verb_type,
            weight: weight.unwrap_or(DEFAULT_WEIGHT),
            vector,
            connections: Connections::new(),
        }
    }
}
