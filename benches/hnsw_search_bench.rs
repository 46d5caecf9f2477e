use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noema::hnsw::{HnswConfig, HnswIndex};
use noema::model::Id;

fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim).map(|i| ((seed.wrapping_mul(31).wrapping_add(i as u64)) % 997) as f32 / 997.0).collect()
}

fn seeded_index(n: u64, dim: usize) -> HnswIndex {
    let mut index = HnswIndex::new(HnswConfig::new(dim as u32)).unwrap();
    for i in 0..n {
        index.insert(Id::from(format!("n{i}")), random_vector(dim, i)).unwrap();
    }
    index
}

fn bench_search(c: &mut Criterion) {
    let index = seeded_index(5000, 128);
    let query = random_vector(128, 42);
    c.bench_function("hnsw_search_k10_over_5000", |b| {
        b.iter(|| {
            let hits = index.search(black_box(&query), 10, None, &|_| true).unwrap();
            black_box(hits.len());
        });
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
