//! Integration tests for crumblr-session

use crumblr_session::*;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_insert_converges() {
    let store = Arc::new(MemorySessionStore::new());
    let sid = generate_session_id();

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        let sid = sid.clone();
        handles.push(tokio::spawn(async move {
            store
                .get_or_insert(&sid, "_csrf_token", format!("candidate-{}", i))
                .await
                .unwrap()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        seen.insert(handle.await.unwrap());
    }

    assert_eq!(seen.len(), 1);
    let live = store.get(&sid, "_csrf_token").await.unwrap().unwrap();
    assert!(seen.contains(&live));
}

#[tokio::test]
async fn test_store_behind_trait_object() {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());

    store.set("abc", "flash", "hello".to_string()).await.unwrap();
    assert!(store.contains("abc", "flash").await.unwrap());

    store.reset("abc").await.unwrap();
    assert!(!store.contains("abc", "flash").await.unwrap());
}
