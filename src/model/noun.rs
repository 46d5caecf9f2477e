//! The noun: an indexed vector with its HNSW adjacency.

use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, globally unique entity id (shared by nouns and verbs).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-level adjacency: level -> neighbor ids at that level.
///
/// Serializes as `{"<level>": [id, ...], ...}` per the wire-format normalization
/// in the storage contract. Sets have no on-disk ordering guarantee; this type
/// re-sorts on every read so consumers observe a deterministic order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(BTreeMap<String, Vec<Id>>);

impl Connections {
    /// Creates an empty connection map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the (deterministically sorted) neighbor ids at `level`.
    #[must_use]
    pub fn at(&self, level: usize) -> &[Id] {
        self.0
            .get(&level.to_string())
            .map_or(&[], |v| v.as_slice())
    }

    /// Replaces the neighbor list at `level` wholesale, sorting for
    /// determinism.
    pub fn set(&mut self, level: usize, mut neighbors: Vec<Id>) {
        neighbors.sort();
        neighbors.dedup();
        self.0.insert(level.to_string(), neighbors);
    }

    /// Iterates over `(level, neighbors)` pairs in ascending level order.
    pub fn levels(&self) -> impl Iterator<Item = (usize, &[Id])> {
        self.0
            .iter()
            .filter_map(|(k, v)| k.parse::<usize>().ok().map(|lvl| (lvl, v.as_slice())))
    }

    /// Highest level with a non-empty (or present) entry, if any.
    #[must_use]
    pub fn max_level(&self) -> Option<usize> {
        self.0.keys().filter_map(|k| k.parse::<usize>().ok()).max()
    }
}

/// An indexed vector ("noun" in the graph model).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Noun {
    /// Globally unique id.
    pub id: Id,
    /// Fixed-length embedding (dimension fixed at index creation).
    pub vector: Vec<f32>,
    /// Per-level HNSW neighbor lists.
    pub connections: Connections,
}

impl Noun {
    /// Creates a noun with no connections yet (before insertion into the graph).
    #[must_use]
    pub fn new(id: Id, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            connections: Connections::new(),
        }
    }
}
