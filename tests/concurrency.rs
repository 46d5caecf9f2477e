//! Covers concurrent insert/search safety: searches running alongside
//! inserts must never observe a torn or partially-written neighbor list.

use noema::query::{Db, DbConfig};
use noema::storage::MemoryBackend;
use std::sync::Arc;

#[tokio::test]
async fn concurrent_inserts_and_searches_never_panic_or_corrupt() {
    let db = Arc::new(Db::init(DbConfig::new(8), Arc::new(MemoryBackend::new()), None).await.unwrap());

    let mut writers = Vec::new();
    for w in 0..4 {
        let db = Arc::clone(&db);
        writers.push(tokio::spawn(async move {
            for i in 0..50 {
                let vector: Vec<f32> = (0..8).map(|d| ((w * 50 + i + d) as f32).sin()).collect();
                db.insert(vector, None, None).await.unwrap();
            }
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..4 {
        let db = Arc::clone(&db);
        readers.push(tokio::spawn(async move {
            let query = vec![0.1; 8];
            for _ in 0..50 {
                let hits = db.search(&query, 5, None, None).await.unwrap();
                assert!(hits.len() <= 5);
            }
        }));
    }

    for w in writers {
        w.await.unwrap();
    }
    for r in readers {
        r.await.unwrap();
    }

    let status = db.status().await;
    assert_eq!(status.size, 200);
}
