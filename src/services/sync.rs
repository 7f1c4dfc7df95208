// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort upload of finished sessions with a local retry queue.
//!
//! A failed upload never fails the session: the session is already durable
//! in the local store, and the copy queued here is retried later.

use crate::db::UserStore;
use crate::models::RunSession;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::{stream, StreamExt};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

const MAX_CONCURRENT_UPLOADS: usize = 4;

/// Upload failure reported by a [`SessionUploader`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("Upload failed: {0}")]
pub struct SyncError(pub String);

impl From<SyncError> for crate::error::TrackerError {
    fn from(e: SyncError) -> Self {
        crate::error::TrackerError::Sync(e.0)
    }
}

/// Remote persistence collaborator.
pub trait SessionUploader: Send + Sync {
    fn upload<'a>(&'a self, session: &'a RunSession) -> BoxFuture<'a, Result<(), SyncError>>;
}

/// Externally visible sync state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// Everything submitted so far has been uploaded
    Synced,
    /// At least one upload is queued for retry
    Error(String),
}

/// Result of a retry pass.
#[derive(Debug, Clone, Default)]
pub struct RetryResult {
    /// Number of sessions uploaded.
    pub uploaded: u32,
    /// Number of sessions still pending.
    pub failed: u32,
    /// Session IDs still pending.
    pub failed_ids: Vec<u64>,
}

impl RetryResult {
    /// Returns true if nothing is left pending.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Upload front-end shared by the tracker and retry scheduling.
#[derive(Clone)]
pub struct SyncService {
    uploader: Arc<dyn SessionUploader>,
    store: UserStore,
    pending: Arc<DashMap<u64, RunSession>>,
    status: Arc<RwLock<SyncStatus>>,
    /// Held from snapshot to write so the last write sees the latest queue
    persist_lock: Arc<Mutex<()>>,
}

impl SyncService {
    /// Create the service, restoring any uploads left pending by a
    /// previous run.
    pub fn new(uploader: Arc<dyn SessionUploader>, store: UserStore) -> Self {
        let pending = Arc::new(DashMap::new());
        for session in store.load_pending_uploads() {
            pending.insert(session.id, session);
        }
        let status = if pending.is_empty() {
            SyncStatus::Idle
        } else {
            SyncStatus::Error(format!("{} uploads pending", pending.len()))
        };
        Self {
            uploader,
            store,
            pending,
            status: Arc::new(RwLock::new(status)),
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn set_status(&self, status: SyncStatus) {
        match self.status.write() {
            Ok(mut guard) => *guard = status,
            Err(e) => *e.into_inner() = status,
        }
    }

    /// Session IDs waiting for retry, ascending.
    pub fn pending_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    async fn persist_pending(&self) {
        let _guard = self.persist_lock.lock().await;
        let mut sessions: Vec<RunSession> =
            self.pending.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by_key(|s| s.id);

        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.save_pending_uploads(&sessions)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to persist pending uploads"),
            Err(e) => tracing::warn!(error = %e, "Pending upload persist task failed"),
        }
    }

    /// Upload one session; on failure queue it for retry.
    ///
    /// Returns `true` if the upload succeeded.
    pub async fn submit(&self, session: RunSession) -> bool {
        match self.uploader.upload(&session).await {
            Ok(()) => {
                tracing::info!(session_id = session.id, "Session uploaded");
                if self.pending.remove(&session.id).is_some() {
                    self.persist_pending().await;
                }
                if self.pending.is_empty() {
                    self.set_status(SyncStatus::Synced);
                }
                true
            }
            Err(e) => {
                tracing::warn!(session_id = session.id, error = %e, "Upload failed, queued for retry");
                self.pending.insert(session.id, session);
                self.persist_pending().await;
                self.set_status(SyncStatus::Error(e.0));
                false
            }
        }
    }

    /// Retry every pending upload.
    pub async fn retry_pending(&self) -> RetryResult {
        let sessions: Vec<RunSession> = self.pending.iter().map(|e| e.value().clone()).collect();
        if sessions.is_empty() {
            return RetryResult::default();
        }
        tracing::info!(count = sessions.len(), "Retrying pending uploads");

        let outcomes: Vec<(u64, Result<(), SyncError>)> = stream::iter(sessions)
            .map(|session| {
                let uploader = self.uploader.clone();
                async move {
                    let result = uploader.upload(&session).await;
                    (session.id, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_UPLOADS)
            .collect()
            .await;

        let mut result = RetryResult::default();
        let mut last_error = None;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    self.pending.remove(&id);
                    result.uploaded += 1;
                }
                Err(e) => {
                    result.failed += 1;
                    result.failed_ids.push(id);
                    last_error = Some(e.0);
                }
            }
        }
        result.failed_ids.sort_unstable();
        self.persist_pending().await;

        match last_error {
            Some(message) => self.set_status(SyncStatus::Error(message)),
            None => self.set_status(SyncStatus::Synced),
        }
        tracing::info!(
            uploaded = result.uploaded,
            failed = result.failed,
            "Retry pass complete"
        );
        result
    }
}

/// Uploader that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUploader;

impl SessionUploader for NoopUploader {
    fn upload<'a>(&'a self, _session: &'a RunSession) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async { Ok(()) })
    }
}
