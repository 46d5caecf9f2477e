#![no_main]

use libfuzzer_sys::fuzz_target;
use noema::hnsw::{HnswConfig, HnswIndex};
use noema::model::Id;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    seed_vectors: Vec<Vec<i8>>,
    query: Vec<i8>,
    k: u8,
}

fuzz_target!(|input: Input| {
    let config = HnswConfig::new(3);
    let Ok(mut index) = HnswIndex::new(config) else { return };

    for (i, raw) in input.seed_vectors.iter().take(32).enumerate() {
        let vector: Vec<f32> = raw.iter().take(3).map(|v| f32::from(*v)).collect();
        if vector.len() != 3 {
            continue;
        }
        let _ = index.insert(Id::from(format!("n{i}")), vector);
    }

    let query: Vec<f32> = input.query.iter().take(3).map(|v| f32::from(*v)).collect();
    if query.len() != 3 {
        return;
    }
    let k = usize::from(input.k).min(50);
    if let Ok(hits) = index.search(&query, k, None, &|_| true) {
        assert!(hits.len() <= k);
    }
});
