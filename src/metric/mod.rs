//! Distance metrics pluggable into the HNSW index.

use serde::{Deserialize, Serialize};

/// A distance function over fixed-length vectors. Lower is closer.
pub trait Metric: Send + Sync {
    /// Computes the distance between two equal-length vectors.
    ///
    /// # Panics
    ///
    /// Panics if `a.len() != b.len()` — callers validate dimension at the
    /// index boundary, so a mismatch here is an internal-consistency bug.
    fn distance(a: &[f32], b: &[f32]) -> f32;
}

/// Squared Euclidean (L2) distance. Cheaper than L2 since it skips the
/// square root; preserves ordering, which is all HNSW needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Squared;

impl Metric for L2Squared {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

/// Dot-product "distance" (negated, so closer is smaller — keeps the
/// min-heap-based search logic metric-agnostic).
#[derive(Debug, Clone, Copy, Default)]
pub struct Dot;

impl Metric for Dot {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>()
    }
}

/// Cosine distance: `1 - cosine_similarity`. The default metric per the
/// external configuration surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Metric for Cosine {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        1.0 - dot / (norm_a * norm_b)
    }
}

/// The distance function an index is configured with, carried alongside
/// `HnswConfig` so it can be serialized and dispatched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceKind {
    /// Cosine distance (default).
    #[default]
    Cosine,
    /// Squared Euclidean distance.
    L2,
    /// Negated dot product.
    Dot,
}

impl DistanceKind {
    /// Computes the distance under this metric.
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => Cosine::distance(a, b),
            Self::L2 => L2Squared::distance(a, b),
            Self::Dot => Dot::distance(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_zero() {
        let v = vec![1.0, 2.0, 3.0];
        assert!(Cosine::distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((Cosine::distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_squared_matches_known_value() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((L2Squared::distance(&a, &b) - 25.0).abs() < 1e-6);
    }
}
