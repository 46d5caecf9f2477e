use crate::metric::DistanceKind;
use serde::{Deserialize, Serialize};

/// HNSW algorithm parameters, fixed for the lifetime of an index.
///
/// # Parameter guidelines
/// - `m`: 12-48 for high recall, 4-8 for speed.
/// - `ef_construction`: higher = better quality, slower build.
/// - `ef_search`: higher = better recall, slower search; must be `>= k`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Vector dimensionality.
    pub dimensions: u32,
    /// Target neighbors per non-bottom level.
    pub m: u32,
    /// Neighbor cap at level 0 (typically `2 * m`).
    pub m_max0: u32,
    /// Candidate-list size during insertion.
    pub ef_construction: u32,
    /// Candidate-list size during query (raised to `k` if smaller).
    pub ef_search: u32,
    /// Distance function.
    pub metric: DistanceKind,
    /// Seed for the level-assignment PRNG (fixed per index for determinism).
    pub seed: u64,
}

impl HnswConfig {
    /// Creates a configuration with the documented defaults: `m=16`,
    /// `m_max0=32`, `ef_construction=200`, `ef_search=50`, cosine distance.
    #[must_use]
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            ef_search: 50,
            metric: DistanceKind::Cosine,
            seed: 0x5eed_0000_c0ff_ee01,
        }
    }

    /// Level-assignment normalizer `m_L = 1 / ln(m)`.
    #[must_use]
    pub fn level_mult(&self) -> f64 {
        1.0 / f64::from(self.m).ln()
    }

    /// Validates the configuration, rejecting nonsensical parameter
    /// combinations the way the rest of the crate validates its configs.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field found.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimensions == 0 {
            return Err("dimensions must be > 0".to_string());
        }
        if self.m <= 1 {
            return Err(format!("m must be > 1, got {}", self.m));
        }
        if self.m_max0 < self.m {
            return Err(format!(
                "m_max0 must be >= m, got {} < {}",
                self.m_max0, self.m
            ));
        }
        if self.ef_construction == 0 {
            return Err("ef_construction must be > 0".to_string());
        }
        if self.ef_search == 0 {
            return Err("ef_search must be > 0".to_string());
        }
        Ok(())
    }
}
