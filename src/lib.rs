//! # noema
//!
//! An embeddable vector-plus-graph database: an HNSW index over "nouns"
//! (vectors, optionally tagged with metadata) and typed "verbs" (vectorized,
//! directed edges between nouns), with k-nearest-neighbor search, optional
//! metadata filtering, pluggable storage backends, and a tiered cache.
//!
//! ## Layout
//!
//! - [`model`] — the domain types: `Noun`, `Verb`, `Id`, `Metadata`, `Statistics`.
//! - [`metric`] — pluggable distance functions (`Cosine`, `L2`, `Dot`).
//! - [`hnsw`] — the HNSW graph: insertion, k-NN search, deletion.
//! - [`cache`] — the L1/L2/L3 tiered cache sitting in front of storage.
//! - [`storage`] — the storage backend contract, adapter, and statistics accumulator.
//! - [`filter`] — metadata filter expressions and pre/post/hybrid search strategy.
//! - [`query`] — [`query::Db`], the engine assembling all of the above behind
//!   the public operation surface (`insert`, `search`, `addVerb`, ...).
//!
//! ## Example
//!
//! ```rust
//! use noema::query::{Db, DbConfig};
//! use noema::storage::MemoryBackend;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let db = Db::init(DbConfig::new(3), Arc::new(MemoryBackend::new()), None)
//!     .await
//!     .expect("failed to init");
//!
//! let id = db.insert(vec![0.1, 0.2, 0.3], None, None).await.expect("insert failed");
//! let hits = db.search(&[0.1, 0.2, 0.3], 5, None, None).await.expect("search failed");
//! assert_eq!(hits[0].id, id);
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]

/// Domain model: nouns, verbs, ids, metadata, statistics.
pub mod model;

/// Distance metrics.
pub mod metric;

/// HNSW graph implementation.
pub mod hnsw;

/// Tiered (L1/L2/L3) cache.
pub mod cache;

/// Storage backend contract, namespaced adapter, statistics accumulator.
pub mod storage;

/// Metadata filter expressions and search strategy selection.
pub mod filter;

/// The query engine assembling the above behind the public operation surface.
pub mod query;

/// Unified error hierarchy.
pub mod error;

pub use error::{DbError, ErrorKind};
pub use query::{CacheStats, Db, DbConfig, DbStatus, SearchResult, TextEmbedder};

/// The crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub fn version() -> &'static str {
    VERSION
}
