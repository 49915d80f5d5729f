use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    management::store::{
        KEY_LIKED_AUDIO_BLOCKS, KEY_PENDING_LIKE_OPERATIONS, Persistence, StoreError, load_json,
        save_json,
    },
    types::{AudioBlock, LikeOperation, OperationKind},
};

/// Owner of the liked-items index and the pending-operations queue.
///
/// Every like/unlike touches both structures in one call and persists both
/// before returning, so an id is in the index exactly when the queue's net
/// effect says "liked". Mutators take `&mut self`; there is no other writer.
pub struct LikesManager<P: Persistence> {
    store: P,
    liked: HashMap<String, AudioBlock>,
    pending: Vec<LikeOperation>,
}

impl<P: Persistence> LikesManager<P> {
    /// Loads the index and queue from `store`. Missing values start empty.
    pub async fn open(store: P) -> Result<Self, StoreError> {
        let liked: HashMap<String, AudioBlock> = load_json(&store, KEY_LIKED_AUDIO_BLOCKS)
            .await?
            .unwrap_or_default();
        let pending: Vec<LikeOperation> = load_json(&store, KEY_PENDING_LIKE_OPERATIONS)
            .await?
            .unwrap_or_default();

        log::debug!(
            "opened likes: {} liked, {} pending",
            liked.len(),
            pending.len()
        );

        Ok(Self {
            store,
            liked,
            pending,
        })
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains_key(id)
    }

    pub fn get_liked_item(&self, id: &str) -> Option<&AudioBlock> {
        self.liked.get(id)
    }

    /// Snapshot of the index, in no particular order.
    pub fn all_liked_items(&self) -> Vec<AudioBlock> {
        self.liked.values().cloned().collect()
    }

    /// Latest queued `like` for `id`.
    ///
    /// Only operations still in the queue are considered: once a like has
    /// been synced and removed, the item stays liked but has no timestamp.
    pub fn get_liked_timestamp(&self, id: &str) -> Option<DateTime<Utc>> {
        self.pending
            .iter()
            .filter(|op| op.kind == OperationKind::Like && op.item_key() == id)
            .map(|op| op.timestamp)
            .max()
    }

    /// Liked items paired with their like time. Items without a queued like
    /// are left out.
    pub fn all_liked_items_with_timestamps(&self) -> Vec<(AudioBlock, DateTime<Utc>)> {
        self.liked
            .iter()
            .filter_map(|(id, item)| {
                self.get_liked_timestamp(id)
                    .map(|timestamp| (item.clone(), timestamp))
            })
            .collect()
    }

    pub fn pending_operations(&self) -> &[LikeOperation] {
        &self.pending
    }

    /// Returns `false` when the item was already liked. On a storage error
    /// the in-memory state is left as it was before the call.
    pub async fn like(
        &mut self,
        item: AudioBlock,
        spin_id: Option<String>,
    ) -> Result<bool, StoreError> {
        let key = item.key();
        if self.is_liked(&key) {
            return Ok(false);
        }

        let operation = LikeOperation::new(item.clone(), OperationKind::Like, spin_id);
        self.liked.insert(key.clone(), item);
        self.pending.push(operation);

        if let Err(e) = self.persist().await {
            self.liked.remove(&key);
            self.pending.pop();
            return Err(e);
        }
        Ok(true)
    }

    /// Returns `false` when the item was not liked.
    pub async fn unlike(
        &mut self,
        item: AudioBlock,
        spin_id: Option<String>,
    ) -> Result<bool, StoreError> {
        let key = item.key();
        let Some(previous) = self.liked.remove(&key) else {
            return Ok(false);
        };

        self.pending
            .push(LikeOperation::new(item, OperationKind::Unlike, spin_id));

        if let Err(e) = self.persist().await {
            self.liked.insert(key, previous);
            self.pending.pop();
            return Err(e);
        }
        Ok(true)
    }

    /// Flips the liked state and returns the new one.
    pub async fn toggle_like(
        &mut self,
        item: AudioBlock,
        spin_id: Option<String>,
    ) -> Result<bool, StoreError> {
        if self.is_liked(&item.key()) {
            self.unlike(item, spin_id).await?;
            Ok(false)
        } else {
            self.like(item, spin_id).await?;
            Ok(true)
        }
    }

    /// Drops expired operations from the queue. The liked index is left
    /// alone: expiry bounds delivery attempts, not the liked state.
    pub async fn cleanup_expired_operations(&mut self) -> Result<usize, StoreError> {
        self.cleanup_expired_operations_at(Utc::now()).await
    }

    pub async fn cleanup_expired_operations_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let before = self.pending.len();
        self.pending.retain(|op| !op.is_expired_at(now));
        let removed = before - self.pending.len();

        if removed > 0 {
            log::debug!("removed {} expired like operations", removed);
            save_json(&self.store, KEY_PENDING_LIKE_OPERATIONS, &self.pending).await?;
        }
        Ok(removed)
    }

    /// Removes a delivered or abandoned operation.
    pub(crate) async fn complete_operation(&mut self, op_id: Uuid) -> Result<bool, StoreError> {
        let Some(position) = self.pending.iter().position(|op| op.id == op_id) else {
            return Ok(false);
        };
        self.pending.remove(position);
        save_json(&self.store, KEY_PENDING_LIKE_OPERATIONS, &self.pending).await?;
        Ok(true)
    }

    /// Swaps the queued entry with the same id for `operation`, keeping its
    /// position in the queue.
    pub(crate) async fn replace_operation(
        &mut self,
        operation: LikeOperation,
    ) -> Result<bool, StoreError> {
        let Some(slot) = self.pending.iter_mut().find(|op| op.id == operation.id) else {
            return Ok(false);
        };
        *slot = operation;
        save_json(&self.store, KEY_PENDING_LIKE_OPERATIONS, &self.pending).await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<(), StoreError> {
        save_json(&self.store, KEY_LIKED_AUDIO_BLOCKS, &self.liked).await?;
        save_json(&self.store, KEY_PENDING_LIKE_OPERATIONS, &self.pending).await
    }
}
