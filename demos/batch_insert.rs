//! Inserts a batch of nouns with metadata, then runs a filtered search.

use noema::query::{Db, DbConfig};
use noema::storage::MemoryBackend;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let db = Db::init(DbConfig::new(4), Arc::new(MemoryBackend::new()), None)
        .await
        .expect("failed to init db");

    for i in 0..100 {
        let vector = vec![i as f32, (i * 2) as f32, (i % 7) as f32, 1.0];
        let mut metadata = HashMap::new();
        let category = if i % 3 == 0 { "featured" } else { "standard" };
        metadata.insert("category".to_string(), noema::model::MetadataValue::String(category.to_string()));
        db.insert(vector, Some(metadata), None).await.expect("insert failed");
    }

    let hits = db
        .search(&[50.0, 100.0, 1.0, 1.0], 5, Some("category = \"featured\""), None)
        .await
        .expect("search failed");

    println!("top featured matches:");
    for hit in hits {
        println!("  {} (distance {:.4})", hit.id, hit.distance);
    }

    let status = db.status().await;
    println!("index size: {}", status.size);
}
