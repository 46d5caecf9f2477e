//! Self-tuning controller: rescales the cache's own knobs from its hit/miss
//! counters and optional storage workload stats. Never reads authoritative
//! state — only its own counters in, its own knobs out.

use std::time::Duration;

/// The cache's tunable knobs, each independently clamped to its documented
/// range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheConfig {
    /// L1 capacity. Clamped to `>= 1000`.
    pub max_size: usize,
    /// L1 eviction trigger as a fraction of `max_size`. Clamped to `[0.6, 0.9]`.
    pub eviction_threshold: f64,
    /// L2 entry TTL. Clamped to `[6h, 48h]`.
    pub warm_ttl: Duration,
    /// Prefetch batch size. Clamped to `[5, 50]`.
    pub batch_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            eviction_threshold: 0.8,
            warm_ttl: Duration::from_secs(24 * 3600),
            batch_size: 15,
        }
    }
}

/// Minimum interval between tuning passes.
pub const TUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Inputs the controller rescales from. All optional fields default to "no
/// signal", leaving the corresponding rule inert.
#[derive(Clone, Copy, Debug, Default)]
pub struct TuningInputs {
    /// Total hits observed since the cache started.
    pub hits: u64,
    /// Total misses observed since the cache started.
    pub misses: u64,
    /// Total L1 evictions observed since the cache started.
    pub evictions: u64,
    /// Fraction of storage operations that were reads, if known.
    pub read_fraction: Option<f64>,
    /// Fraction of storage operations that were writes, if known.
    pub write_fraction: Option<f64>,
    /// Fraction of accesses that were bulk/prefetch operations, if known.
    pub bulk_fraction: Option<f64>,
    /// Fraction of storage operations that were updates, if known.
    pub update_fraction: Option<f64>,
    /// Total noun+verb count, if storage can report it cheaply.
    pub total_entity_count: Option<u64>,
    /// Estimated free RAM in bytes, if the environment can report it.
    pub free_ram_bytes: Option<u64>,
}

impl TuningInputs {
    fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total < 100 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }
}

const HOUR: u64 = 3600;

/// Computes the next [`CacheConfig`] from the current one and fresh
/// [`TuningInputs`]. Pure and idempotent: calling it twice with unchanged
/// inputs returns the same output both times.
#[must_use]
pub fn tune(current: &CacheConfig, inputs: &TuningInputs) -> CacheConfig {
    CacheConfig {
        max_size: tune_max_size(current.max_size, inputs),
        eviction_threshold: tune_eviction_threshold(current.eviction_threshold, inputs),
        warm_ttl: tune_warm_ttl(current.warm_ttl, inputs),
        batch_size: tune_batch_size(current.batch_size, inputs),
    }
}

fn tune_max_size(current: usize, inputs: &TuningInputs) -> usize {
    let mut base = inputs
        .free_ram_bytes
        .map(|bytes| ((bytes / 10) / 1024).max(1000) as usize)
        .unwrap_or(current);

    if let Some(ratio) = inputs.hit_ratio() {
        if ratio < 0.5 {
            base = ((base as f64) * (1.0 + (0.5 - ratio))) as usize;
        }
    }

    if let Some(total) = inputs.total_entity_count {
        let ceiling = ((total as f64) * 0.2) as usize;
        if ceiling >= 1000 {
            base = base.min(ceiling);
        }
    }

    base.max(1000)
}

fn tune_eviction_threshold(current: f64, inputs: &TuningInputs) -> f64 {
    let mut value = current;
    if let Some(ratio) = inputs.hit_ratio() {
        if ratio > 0.8 {
            value = value.max(0.9);
        } else if ratio < 0.5 {
            value = value.min(0.6);
        }
    }
    if let Some(reads) = inputs.read_fraction {
        if reads > 0.8 {
            value += 0.05;
        }
    }
    if let Some(writes) = inputs.write_fraction {
        if writes > 0.5 {
            value -= 0.1;
        }
    }
    value.clamp(0.6, 0.9)
}

fn tune_warm_ttl(current: Duration, inputs: &TuningInputs) -> Duration {
    let mut hours = current.as_secs() / HOUR;
    if let Some(updates) = inputs.update_fraction {
        if updates > 0.3 {
            hours = hours.saturating_sub(2).max(6);
        } else if updates < 0.1 {
            hours = (hours + 2).min(48);
        }
    }
    Duration::from_secs(hours.clamp(6, 48) * HOUR)
}

fn tune_batch_size(current: usize, inputs: &TuningInputs) -> usize {
    let mut value = current as f64;
    if let Some(bulk) = inputs.bulk_fraction {
        if bulk > 0.5 {
            value *= 1.5;
        }
    }
    if let Some(ratio) = inputs.hit_ratio() {
        if ratio > 0.8 {
            value *= 0.8;
        } else if ratio < 0.5 {
            value *= 1.2;
        }
    }
    (value.round() as usize).clamp(5, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_is_idempotent_for_unchanged_inputs() {
        let config = CacheConfig::default();
        let inputs = TuningInputs { hits: 900, misses: 100, read_fraction: Some(0.9), ..Default::default() };
        let once = tune(&config, &inputs);
        let twice = tune(&once, &inputs);
        assert_eq!(once, twice);
    }

    #[test]
    fn max_size_never_drops_below_1000() {
        let config = CacheConfig { max_size: 1000, ..Default::default() };
        let inputs = TuningInputs { hits: 10, misses: 990, ..Default::default() };
        let tuned = tune(&config, &inputs);
        assert!(tuned.max_size >= 1000);
    }

    #[test]
    fn eviction_threshold_stays_in_range() {
        let config = CacheConfig::default();
        let inputs = TuningInputs { hits: 95, misses: 5, write_fraction: Some(0.9), ..Default::default() };
        let tuned = tune(&config, &inputs);
        assert!((0.6..=0.9).contains(&tuned.eviction_threshold));
    }

    #[test]
    fn batch_size_stays_in_range() {
        let config = CacheConfig::default();
        let inputs = TuningInputs { bulk_fraction: Some(0.9), hits: 10, misses: 990, ..Default::default() };
        let tuned = tune(&config, &inputs);
        assert!((5..=50).contains(&tuned.batch_size));
    }
}
