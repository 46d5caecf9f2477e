#![no_main]

use libfuzzer_sys::fuzz_target;
use noema::hnsw::{HnswConfig, HnswIndex};
use noema::model::Id;

#[derive(Debug, arbitrary::Arbitrary)]
struct Op {
    id: u8,
    vector: Vec<i8>,
    delete: bool,
}

fuzz_target!(|ops: Vec<Op>| {
    let config = HnswConfig::new(4);
    let Ok(mut index) = HnswIndex::new(config) else { return };

    for op in ops.into_iter().take(64) {
        let id = Id::from(format!("n{}", op.id));
        if op.delete {
            let _ = index.delete(&id);
            continue;
        }
        let vector: Vec<f32> = op.vector.iter().take(4).map(|v| f32::from(*v)).collect();
        if vector.len() != 4 {
            continue;
        }
        let _ = index.insert(id, vector);
    }

    // Internal bookkeeping must never under/overflow regardless of the op
    // sequence above.
    assert!(index.live_len() <= index.len());
});
