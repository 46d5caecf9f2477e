use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noema::model::Noun;
use noema::storage::adapter::{NounFilter, Pagination, StorageAdapter};
use noema::storage::MemoryBackend;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn bench_storage(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let adapter = StorageAdapter::new(Arc::new(MemoryBackend::new()));

    rt.block_on(async {
        for i in 0..500 {
            let id = noema::model::Id::from(format!("n{i}"));
            adapter.put_noun(&Noun::new(id, vec![i as f32; 8])).await.unwrap();
        }
    });

    c.bench_function("storage_get_noun", |b| {
        b.iter(|| {
            rt.block_on(async {
                let noun = adapter.get_noun(black_box(&noema::model::Id::from("n250"))).await.unwrap();
                black_box(noun);
            });
        });
    });

    c.bench_function("storage_list_nouns_page", |b| {
        b.iter(|| {
            rt.block_on(async {
                let page = adapter
                    .list_nouns(black_box(&Pagination::new(0, 100)), &NounFilter::default())
                    .await
                    .unwrap();
                black_box(page.items.len());
            });
        });
    });
}

criterion_group!(benches, bench_storage);
criterion_main!(benches);
