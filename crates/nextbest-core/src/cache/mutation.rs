//! Two-phase optimistic status change.
//!
//! ```text
//! begin()  -> patch applied, token held
//! settle() -> Committed  (server accepted: drop token, invalidate)
//!          -> RolledBack (server refused: restore snapshot, invalidate)
//! ```

use super::{CacheKey, RecommendationCache, RollbackToken};
use crate::error::CacheError;
use crate::task::TaskStatus;

/// How an in-flight mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Committed,
    RolledBack,
}

/// One in-flight status change against one cached list.
#[derive(Debug)]
pub struct PendingMutation {
    token: RollbackToken,
    status: TaskStatus,
}

impl PendingMutation {
    /// Phase one: overwrite the cached task's status.
    pub fn begin(
        cache: &mut RecommendationCache,
        key: CacheKey,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Self, CacheError> {
        let token = cache.optimistic_patch(key, task_id, |task| task.status = status)?;
        Ok(Self { token, status })
    }

    pub fn task_id(&self) -> &str {
        self.token.task_id()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Status the task had before the patch, if it was cached.
    pub fn previous_status(&self) -> Option<TaskStatus> {
        self.token.snapshot().map(|task| task.status)
    }

    /// Phase two: commit when the server accepted the change, roll back otherwise.
    pub fn settle(self, cache: &mut RecommendationCache, accepted: bool) -> Result<Settlement, CacheError> {
        if accepted {
            tracing::info!(task_id = %self.token.task_id(), status = %self.status, "status change committed");
            cache.commit(self.token)?;
            Ok(Settlement::Committed)
        } else {
            cache.rollback(self.token)?;
            Ok(Settlement::RolledBack)
        }
    }
}
