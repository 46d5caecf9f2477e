//! Statistics snapshot shape — the persisted, wire-format counterpart of the
//! live accumulator in [`crate::storage::statistics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point-in-time statistics snapshot, keyed per service tag.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Noun count per service.
    #[serde(default, rename = "nounCount")]
    pub noun_count: HashMap<String, u64>,
    /// Verb count per service.
    #[serde(default, rename = "verbCount")]
    pub verb_count: HashMap<String, u64>,
    /// Metadata entry count per service.
    #[serde(default, rename = "metadataCount")]
    pub metadata_count: HashMap<String, u64>,
    /// Total nodes tracked by the live HNSW index.
    #[serde(default, rename = "hnswIndexSize")]
    pub hnsw_index_size: u64,
    /// RFC3339 timestamp of the last update.
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// The kind of counter a statistics update applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatisticKind {
    /// Noun count.
    Noun,
    /// Verb count.
    Verb,
    /// Metadata entry count.
    Metadata,
}

impl Statistics {
    /// A freshly zeroed snapshot, timestamped now.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            noun_count: HashMap::new(),
            verb_count: HashMap::new(),
            metadata_count: HashMap::new(),
            hnsw_index_size: 0,
            last_updated: Utc::now(),
        }
    }

    fn counter_mut(&mut self, kind: StatisticKind) -> &mut HashMap<String, u64> {
        match kind {
            StatisticKind::Noun => &mut self.noun_count,
            StatisticKind::Verb => &mut self.verb_count,
            StatisticKind::Metadata => &mut self.metadata_count,
        }
    }

    /// Increments the counter for `kind`/`service` by one.
    pub fn increment(&mut self, kind: StatisticKind, service: &str) {
        *self
            .counter_mut(kind)
            .entry(service.to_string())
            .or_insert(0) += 1;
        self.last_updated = Utc::now();
    }

    /// Decrements the counter for `kind`/`service` by one, saturating at zero.
    pub fn decrement(&mut self, kind: StatisticKind, service: &str) {
        if let Some(counter) = self.counter_mut(kind).get_mut(service) {
            *counter = counter.saturating_sub(1);
        }
        self.last_updated = Utc::now();
    }
}
