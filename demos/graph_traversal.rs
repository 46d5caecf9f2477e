//! Builds a small noun graph connected by typed verbs, then walks outgoing
//! edges from one noun.

use noema::query::{Db, DbConfig};
use noema::storage::adapter::{Pagination, VerbFilter};
use noema::storage::MemoryBackend;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let db = Db::init(DbConfig::new(3), Arc::new(MemoryBackend::new()), None)
        .await
        .expect("failed to init db");

    let alice = db.insert(vec![1.0, 0.0, 0.0], None, None).await.unwrap();
    let bob = db.insert(vec![0.0, 1.0, 0.0], None, None).await.unwrap();
    let carol = db.insert(vec![0.0, 0.0, 1.0], None, None).await.unwrap();

    db.add_verb(alice.clone(), bob.clone(), "follows".to_string(), None, None, vec![0.5, 0.5, 0.0], None)
        .await
        .unwrap();
    db.add_verb(alice.clone(), carol.clone(), "follows".to_string(), None, None, vec![0.5, 0.0, 0.5], None)
        .await
        .unwrap();

    let outgoing = db
        .list_verbs(
            &Pagination::new(0, 10),
            &VerbFilter { source_id: Some(alice.clone()), ..Default::default() },
            None,
        )
        .await
        .unwrap();

    println!("edges from {alice}:");
    for verb in outgoing.items {
        println!("  {} -[{}]-> {}", verb.source_id, verb.verb_type, verb.target_id);
    }

    let similar = db.find_similar(&alice, 2, None).await.unwrap();
    println!("nouns similar to {alice}:");
    for hit in similar {
        println!("  {} (distance {:.4})", hit.id, hit.distance);
    }
}
