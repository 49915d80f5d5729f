//! Delivery of queued likes to the station backend.
//!
//! Each queued [`LikeOperation`] moves through:
//!
//! ```text
//! pending ── success ───────────────────────────▶ removed
//!    │ ─── transient failure, retries left ─────▶ pending (retry_count + 1)
//!    │ ─── transient failure, none left ────────▶ dropped
//!    │ ─── permanent failure ───────────────────▶ dropped
//!    └──── expired before delivery ─────────────▶ dropped
//! ```
//!
//! A pass works on a snapshot of the queue in insertion order. Once an item
//! fails transiently, its later operations in the same pass are left alone so
//! the backend never sees an unlike before the like it undoes. An
//! authorization failure stops the pass without spending any retries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    management::{LikesManager, Persistence, StoreError},
    radio::{ApiError, LikesApi},
    types::{LikeOperation, OperationKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Expired,
    Rejected(String),
    RetriesExhausted(String),
}

#[derive(Debug, Clone)]
pub struct DroppedOperation {
    pub operation: LikeOperation,
    pub reason: DropReason,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: usize,
    pub retried: usize,
    pub deferred: usize,
    pub dropped: Vec<DroppedOperation>,
    /// Set when the pass stopped on an authorization failure.
    pub aborted: Option<String>,
}

impl SyncReport {
    pub fn expired(&self) -> usize {
        self.dropped
            .iter()
            .filter(|d| d.reason == DropReason::Expired)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.retried == 0 && self.deferred == 0 && self.dropped.is_empty() && self.aborted.is_none()
    }
}

/// Outcome of one operation, before it is applied to the queue.
enum Settlement {
    Remove,
    Retry(LikeOperation),
    Drop(DropReason),
}

pub struct SyncWorker<'a, A: LikesApi + ?Sized> {
    api: &'a A,
    on_progress: Option<Box<dyn Fn(&LikeOperation) + Send + Sync + 'a>>,
}

impl<'a, A: LikesApi + ?Sized> SyncWorker<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            on_progress: None,
        }
    }

    /// Called before each delivery attempt.
    pub fn on_progress(mut self, callback: impl Fn(&LikeOperation) + Send + Sync + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub async fn run<P: Persistence>(
        &self,
        likes: &mut LikesManager<P>,
    ) -> Result<SyncReport, StoreError> {
        self.run_at(likes, Utc::now()).await
    }

    pub async fn run_at<P: Persistence>(
        &self,
        likes: &mut LikesManager<P>,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, StoreError> {
        let snapshot: Vec<LikeOperation> = likes.pending_operations().to_vec();
        let mut report = SyncReport::default();
        let mut blocked: HashSet<String> = HashSet::new();

        log::debug!("sync pass over {} operations", snapshot.len());

        for operation in snapshot {
            let key = operation.item_key();
            if blocked.contains(&key) {
                report.deferred += 1;
                continue;
            }

            let settlement = if operation.is_expired_at(now) {
                Settlement::Drop(DropReason::Expired)
            } else {
                if let Some(callback) = &self.on_progress {
                    callback(&operation);
                }

                match self.deliver(&operation).await {
                    Ok(()) => Settlement::Remove,
                    Err(ApiError::Unauthorized(message)) => {
                        log::warn!("sync stopped: {}", message);
                        report.aborted = Some(message);
                        break;
                    }
                    Err(ApiError::Permanent(message)) => {
                        Settlement::Drop(DropReason::Rejected(message))
                    }
                    Err(ApiError::Transient(message)) => {
                        blocked.insert(key);
                        let retried = operation.incrementing_retry_count();
                        if retried.should_retry() {
                            Settlement::Retry(retried)
                        } else {
                            Settlement::Drop(DropReason::RetriesExhausted(message))
                        }
                    }
                }
            };

            match settlement {
                Settlement::Remove => {
                    likes.complete_operation(operation.id).await?;
                    report.synced += 1;
                }
                Settlement::Retry(retried) => {
                    log::debug!(
                        "{} {} failed, attempt {}",
                        retried.kind,
                        retried.audio_block.id,
                        retried.retry_count
                    );
                    likes.replace_operation(retried).await?;
                    report.retried += 1;
                }
                Settlement::Drop(reason) => {
                    log::info!(
                        "dropping {} {}: {:?}",
                        operation.kind,
                        operation.audio_block.id,
                        reason
                    );
                    likes.complete_operation(operation.id).await?;
                    report.dropped.push(DroppedOperation { operation, reason });
                }
            }
        }

        Ok(report)
    }

    async fn deliver(&self, operation: &LikeOperation) -> Result<(), ApiError> {
        match operation.kind {
            OperationKind::Like => self.api.add_like(operation).await,
            OperationKind::Unlike => self.api.remove_like(operation).await,
        }
    }
}
