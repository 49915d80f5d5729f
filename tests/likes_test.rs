use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use likesync::{
    management::{
        FileStore, LikesManager, MemoryStore, Persistence, StoreError,
        store::{KEY_LIKED_AUDIO_BLOCKS, KEY_PENDING_LIKE_OPERATIONS, load_json, save_json},
    },
    types::{AudioBlock, LikeOperation, OperationKind},
};
use std::collections::HashMap;
use uuid::Uuid;

fn block(title: &str) -> AudioBlock {
    AudioBlock::new(Uuid::new_v4(), title, "Test Artist")
}

async fn empty_manager() -> LikesManager<MemoryStore> {
    LikesManager::open(MemoryStore::new()).await.unwrap()
}

#[tokio::test]
async fn test_open_empty_store() {
    let likes = empty_manager().await;

    assert!(likes.all_liked_items().is_empty());
    assert!(likes.pending_operations().is_empty());
}

#[tokio::test]
async fn test_like_then_unlike() {
    let mut likes = empty_manager().await;
    let a = block("A");
    let key = a.key();

    assert!(likes.like(a.clone(), None).await.unwrap());
    assert!(likes.is_liked(&key));
    assert_eq!(likes.all_liked_items(), vec![a.clone()]);
    assert_eq!(likes.pending_operations().len(), 1);
    assert_eq!(likes.pending_operations()[0].kind, OperationKind::Like);

    assert!(likes.unlike(a.clone(), None).await.unwrap());
    assert!(!likes.is_liked(&key));
    assert!(likes.all_liked_items().is_empty());

    // the queue is not compacted
    let kinds: Vec<OperationKind> = likes.pending_operations().iter().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![OperationKind::Like, OperationKind::Unlike]);
    assert!(likes.pending_operations().iter().all(|op| op.audio_block == a));
}

#[tokio::test]
async fn test_like_twice_is_idempotent() {
    let mut likes = empty_manager().await;
    let a = block("A");

    assert!(likes.like(a.clone(), None).await.unwrap());
    assert!(!likes.like(a.clone(), Some("spin".to_string())).await.unwrap());

    assert_eq!(likes.all_liked_items().len(), 1);
    assert_eq!(likes.pending_operations().len(), 1);
}

#[tokio::test]
async fn test_unlike_without_like_is_noop() {
    let mut likes = empty_manager().await;

    assert!(!likes.unlike(block("A"), None).await.unwrap());
    assert!(likes.all_liked_items().is_empty());
    assert!(likes.pending_operations().is_empty());
}

#[tokio::test]
async fn test_toggle_symmetry() {
    let mut likes = empty_manager().await;
    let a = block("A");

    assert!(likes.toggle_like(a.clone(), None).await.unwrap());
    assert!(likes.is_liked(&a.key()));

    assert!(!likes.toggle_like(a.clone(), None).await.unwrap());
    assert!(!likes.is_liked(&a.key()));
    assert_eq!(likes.pending_operations().len(), 2);
}

#[tokio::test]
async fn test_get_liked_item() {
    let mut likes = empty_manager().await;
    let a = block("A");
    likes.like(a.clone(), None).await.unwrap();

    assert_eq!(likes.get_liked_item(&a.key()).map(|b| b.title.as_str()), Some("A"));
    assert!(likes.get_liked_item(&Uuid::new_v4().to_string()).is_none());
}

#[tokio::test]
async fn test_liked_timestamp_is_latest_like() {
    let store = Arc::new(MemoryStore::new());
    let a = block("A");
    let now = Utc::now();

    let older = LikeOperation::with_timestamp(a.clone(), OperationKind::Like, now - Duration::hours(3), None);
    let unlike = LikeOperation::with_timestamp(a.clone(), OperationKind::Unlike, now - Duration::hours(2), None);
    let newer = LikeOperation::with_timestamp(a.clone(), OperationKind::Like, now - Duration::hours(1), None);

    let mut index = HashMap::new();
    index.insert(a.key(), a.clone());
    save_json(&*store, KEY_LIKED_AUDIO_BLOCKS, &index).await.unwrap();
    // queue order deliberately not chronological
    save_json(&*store, KEY_PENDING_LIKE_OPERATIONS, &vec![newer.clone(), older, unlike])
        .await
        .unwrap();

    let likes = LikesManager::open(Arc::clone(&store)).await.unwrap();

    assert_eq!(likes.get_liked_timestamp(&a.key()), Some(newer.timestamp));
}

#[tokio::test]
async fn test_liked_timestamp_missing_when_not_queued() {
    let likes = empty_manager().await;
    assert!(likes.get_liked_timestamp(&Uuid::new_v4().to_string()).is_none());
}

#[tokio::test]
async fn test_items_with_timestamps_drop_items_without_queued_like() {
    let store = Arc::new(MemoryStore::new());
    let queued = block("Queued");
    let synced = block("Synced");

    let mut index = HashMap::new();
    index.insert(queued.key(), queued.clone());
    index.insert(synced.key(), synced.clone());
    save_json(&*store, KEY_LIKED_AUDIO_BLOCKS, &index).await.unwrap();
    let op = LikeOperation::new(queued.clone(), OperationKind::Like, None);
    save_json(&*store, KEY_PENDING_LIKE_OPERATIONS, &vec![op.clone()])
        .await
        .unwrap();

    let likes = LikesManager::open(Arc::clone(&store)).await.unwrap();

    assert!(likes.is_liked(&synced.key()));
    assert_eq!(likes.all_liked_items().len(), 2);
    assert_eq!(
        likes.all_liked_items_with_timestamps(),
        vec![(queued, op.timestamp)]
    );
}

#[tokio::test]
async fn test_cleanup_keeps_fresh_operations() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let fresh = LikeOperation::new(block("Fresh"), OperationKind::Like, None);
    let stale = LikeOperation::with_timestamp(block("Stale"), OperationKind::Like, now - Duration::days(8), None);

    let mut index = HashMap::new();
    index.insert(stale.item_key(), stale.audio_block.clone());
    index.insert(fresh.item_key(), fresh.audio_block.clone());
    save_json(&*store, KEY_LIKED_AUDIO_BLOCKS, &index).await.unwrap();
    save_json(&*store, KEY_PENDING_LIKE_OPERATIONS, &vec![stale.clone(), fresh.clone()])
        .await
        .unwrap();

    let mut likes = LikesManager::open(Arc::clone(&store)).await.unwrap();
    assert_eq!(likes.cleanup_expired_operations().await.unwrap(), 1);

    assert_eq!(likes.pending_operations(), &[fresh.clone()]);
    // expiry never un-likes
    assert!(likes.is_liked(&stale.item_key()));

    let persisted: Vec<LikeOperation> = load_json(&*store, KEY_PENDING_LIKE_OPERATIONS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted, vec![fresh]);
}

#[tokio::test]
async fn test_cleanup_on_fresh_queue_is_noop() {
    let mut likes = empty_manager().await;
    likes.like(block("A"), None).await.unwrap();

    assert_eq!(likes.cleanup_expired_operations().await.unwrap(), 0);
    assert_eq!(likes.pending_operations().len(), 1);
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let a = block("A");
    let b = block("B");

    let queued = {
        let mut likes = LikesManager::open(FileStore::new(dir.path().to_path_buf()))
            .await
            .unwrap();
        likes.like(a.clone(), Some("spin-1".to_string())).await.unwrap();
        likes.like(b.clone(), None).await.unwrap();
        likes.unlike(b.clone(), None).await.unwrap();
        likes.pending_operations().to_vec()
    };

    assert!(dir.path().join("likedAudioBlocks.json").is_file());
    assert!(dir.path().join("pendingLikeOperations.json").is_file());

    let likes = LikesManager::open(FileStore::new(dir.path().to_path_buf()))
        .await
        .unwrap();

    assert!(likes.is_liked(&a.key()));
    assert!(!likes.is_liked(&b.key()));
    assert_eq!(likes.pending_operations(), queued.as_slice());
    assert_eq!(likes.pending_operations()[0].spin_id.as_deref(), Some("spin-1"));
}

#[tokio::test]
async fn test_corrupt_state_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pendingLikeOperations.json"), "{ not json").unwrap();

    let result = LikesManager::open(FileStore::new(dir.path().to_path_buf())).await;

    assert!(result.is_err());
}

async fn write_repeatedly(store: &FileStore, tag: &str) -> Result<(), StoreError> {
    for i in 0..25 {
        store
            .write(KEY_PENDING_LIKE_OPERATIONS, &format!("[\"{tag}-{i}\"]"))
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_separate_stores_can_write_the_same_key() {
    let dir = tempfile::tempdir().unwrap();
    // two stores on one directory do not share a lock, like two CLI processes
    let first = FileStore::new(dir.path().to_path_buf());
    let second = FileStore::new(dir.path().to_path_buf());

    let (a, b) = tokio::join!(
        write_repeatedly(&first, "a"),
        write_repeatedly(&second, "b")
    );
    a.unwrap();
    b.unwrap();

    let stored = first.read(KEY_PENDING_LIKE_OPERATIONS).await.unwrap().unwrap();
    assert!(stored == "[\"a-24\"]" || stored == "[\"b-24\"]", "{stored}");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

#[async_trait]
impl Persistence for FlakyStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.write(key, contents).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn test_failed_write_leaves_state_unchanged() {
    let store = Arc::new(FlakyStore::default());
    let mut likes = LikesManager::open(Arc::clone(&store)).await.unwrap();
    let (a, b) = (block("A"), block("B"));
    likes.like(a.clone(), None).await.unwrap();
    let queued = likes.pending_operations().to_vec();

    store.failing.store(true, Ordering::SeqCst);

    assert!(likes.like(b.clone(), None).await.is_err());
    assert!(!likes.is_liked(&b.key()));
    assert_eq!(likes.pending_operations(), queued.as_slice());

    assert!(likes.unlike(a.clone(), None).await.is_err());
    assert!(likes.is_liked(&a.key()));
    assert_eq!(likes.pending_operations(), queued.as_slice());

    store.failing.store(false, Ordering::SeqCst);
    assert!(likes.unlike(a.clone(), None).await.unwrap());
    assert!(!likes.is_liked(&a.key()));
}
