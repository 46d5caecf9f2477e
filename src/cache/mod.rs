//! Three-level cache sitting between the HNSW index and persistence: L1
//! (hot, in-process), L2 (warm, TTL'd, same backend), L3 (cold, the
//! authoritative store itself). See [`tiered::TieredCache`] for the read/
//! write paths and [`tuning`] for the self-tuning controller.

pub mod l1;
pub mod tiered;
pub mod tuning;

pub use tiered::TieredCache;
pub use tuning::{CacheConfig, TuningInputs};
