use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noema::hnsw::{HnswConfig, HnswIndex};
use noema::model::Id;

fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim).map(|i| ((seed.wrapping_mul(31).wrapping_add(i as u64)) % 997) as f32 / 997.0).collect()
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("hnsw_insert_1000x128", |b| {
        b.iter(|| {
            let mut index = HnswIndex::new(HnswConfig::new(128)).unwrap();
            for i in 0..1000u64 {
                let id = Id::from(format!("n{i}"));
                index.insert(id, random_vector(128, i)).unwrap();
            }
            black_box(index.len());
        });
    });
}

criterion_group!(benches, bench_insert);
criterion_main!(benches);
