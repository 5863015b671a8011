//! Passive recommendation feed.
//!
//! Binds the cached passive list to the actions a list view offers: mark
//! done, change status, dismiss. Status changes are optimistic; the cached
//! item changes before the request is sent and is restored if the server
//! refuses. Dismissals are local to this feed and never reach the server.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Notify;

use crate::api::{RecommendationItem, RecommendationSource, TaskMutator, DEFAULT_LIST_LIMIT};
use crate::cache::{CacheKey, PendingMutation, RecommendationCache, Settlement, SharedCache};
use crate::error::{ApiError, CacheError};
use crate::task::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible message produced by a feed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub task_id: Option<String>,
}

impl Notice {
    pub fn info(task_id: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            task_id: Some(task_id.to_string()),
        }
    }

    pub fn error(task_id: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            task_id: Some(task_id.to_string()),
        }
    }
}

pub struct RecommendationFeed<S, M> {
    source: S,
    mutator: M,
    cache: SharedCache,
    key: CacheKey,
    /// Signalled whenever a status change settles.
    settled: Notify,
    dismissed: Mutex<HashSet<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl<S: RecommendationSource, M: TaskMutator> RecommendationFeed<S, M> {
    pub fn new(source: S, mutator: M) -> Self {
        Self::with_cache(source, mutator, RecommendationCache::shared(), DEFAULT_LIST_LIMIT)
    }

    /// Feed of up to `limit` items backed by an existing cache.
    pub fn with_cache(source: S, mutator: M, cache: SharedCache, limit: u32) -> Self {
        Self {
            source,
            mutator,
            cache,
            key: CacheKey::passive(limit),
            settled: Notify::new(),
            dismissed: Mutex::default(),
            notices: Mutex::default(),
        }
    }

    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    // ── Reading ──────────────────────────────────────────────────────

    /// Cached list if fresh, otherwise a refetch.
    pub async fn refresh(&self) -> Result<Vec<RecommendationItem>, ApiError> {
        let cached = self.lock_cache().get(&self.key).map(<[_]>::to_vec);
        match cached {
            Some(items) => Ok(items),
            None => self.force_refresh().await,
        }
    }

    /// Refetch regardless of cache state.
    ///
    /// When the response was superseded by a status change, the cached list
    /// (with the optimistic state) is returned instead of the response.
    pub async fn force_refresh(&self) -> Result<Vec<RecommendationItem>, ApiError> {
        let ticket = self.lock_cache().begin_fetch(self.key);
        let items = self.source.list_recommendations(self.key.limit()).await?;

        let mut cache = self.lock_cache();
        if cache.complete_fetch(ticket, items.clone()) {
            return Ok(items);
        }
        Ok(cache.peek(&self.key).map(<[_]>::to_vec).unwrap_or(items))
    }

    /// Everything cached for this feed, dismissed items included, in server order.
    pub fn items(&self) -> Vec<RecommendationItem> {
        self.lock_cache()
            .peek(&self.key)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    }

    /// Cached items minus dismissals.
    pub fn visible_items(&self) -> Vec<RecommendationItem> {
        let dismissed = self.lock_dismissed();
        self.items()
            .into_iter()
            .filter(|item| !dismissed.contains(&item.task.id))
            .collect()
    }

    /// Highest-ranked item that has not been dismissed.
    pub fn top_recommendation(&self) -> Option<RecommendationItem> {
        self.visible_items().into_iter().next()
    }

    // ── Dismissal ────────────────────────────────────────────────────

    /// Hide `task_id` for the rest of this session. Returns false if it was already hidden.
    pub fn dismiss(&self, task_id: &str) -> bool {
        let added = self.lock_dismissed().insert(task_id.to_string());
        if added {
            tracing::debug!(task_id, "recommendation dismissed");
        }
        added
    }

    pub fn is_dismissed(&self, task_id: &str) -> bool {
        self.lock_dismissed().contains(task_id)
    }

    pub fn clear_dismissed(&self) {
        self.lock_dismissed().clear();
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn mark_done(&self, task_id: &str) -> Result<Settlement, CacheError> {
        self.set_status(task_id, TaskStatus::Done).await
    }

    /// Optimistically set a task's status and settle against the server.
    ///
    /// Waits while an earlier change to the same task is unsettled. Either
    /// outcome queues a [`Notice`]; a server failure also rolls the cache
    /// back. Only cache bookkeeping errors are returned.
    pub async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<Settlement, CacheError> {
        let pending = loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let attempt = {
                let mut cache = self.lock_cache();
                PendingMutation::begin(&mut cache, self.key, task_id, status)
            };
            match attempt {
                Ok(pending) => break pending,
                Err(CacheError::PatchOutstanding { .. }) => {
                    tracing::debug!(task_id, "waiting for earlier status change to settle");
                    notified.await;
                }
                Err(e) => return Err(e),
            }
        };

        let result = self.mutator.update_task_status(task_id, status).await;

        let settlement = {
            let mut cache = self.lock_cache();
            let settlement = pending.settle(&mut cache, result.is_ok());
            // Other modes may list the same task with its old status.
            cache.invalidate(|key| *key != self.key);
            settlement
        };
        self.settled.notify_waiters();

        let notice = match result {
            Ok(_) => Notice::info(task_id, format!("Marked task as {status}")),
            Err(e) => {
                tracing::warn!(task_id, %status, error = %e, "status change failed");
                Notice::error(task_id, format!("Could not mark task as {status}: {e}"))
            }
        };
        self.lock_notices().push(notice);
        settlement
    }

    /// Drain queued notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock_notices())
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn lock_cache(&self) -> MutexGuard<'_, RecommendationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_dismissed(&self) -> MutexGuard<'_, HashSet<String>> {
        self.dismissed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_notices(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

mod feed_tests;
