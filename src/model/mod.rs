//! Domain model: nouns, verbs, metadata, and statistics snapshots.

/// Metadata value types and the opaque metadata map.
pub mod metadata;
/// The indexed vector ("noun") and its HNSW adjacency.
pub mod noun;
/// Statistics snapshot shape.
pub mod stats;
/// The typed, vectorized edge ("verb").
pub mod verb;

pub use metadata::{noun_type, Metadata, MetadataValue, NOUN_TYPE_FIELD};
pub use noun::{Connections, Id, Noun};
pub use stats::{StatisticKind, Statistics};
pub use verb::Verb;
