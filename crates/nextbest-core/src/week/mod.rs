//! Weekly planning: review suggested tasks and promote a selection.

use std::collections::HashSet;
use std::sync::PoisonError;

use crate::api::{RecommendationItem, RecommendationSource, TaskMutator};
use crate::cache::{CacheKey, CacheMode, SharedCache};
use crate::error::ApiError;

/// Suggestions for the coming week plus the user's selection.
///
/// Every suggestion starts selected.
#[derive(Debug, Clone)]
pub struct WeekPlan {
    items: Vec<RecommendationItem>,
    selected: HashSet<String>,
    cache: Option<SharedCache>,
}

impl WeekPlan {
    pub fn new(items: Vec<RecommendationItem>) -> Self {
        let selected = items.iter().map(|item| item.task.id.clone()).collect();
        Self {
            items,
            selected,
            cache: None,
        }
    }

    /// Ask `source` for up to `limit` suggestions.
    pub async fn fetch<S: RecommendationSource>(source: &S, limit: u32) -> Result<Self, ApiError> {
        Ok(Self::new(source.suggest_week(limit).await?))
    }

    /// Like [`fetch`](Self::fetch), reusing a fresh cached list when there is one.
    pub async fn fetch_cached<S: RecommendationSource>(
        source: &S,
        cache: SharedCache,
        limit: u32,
    ) -> Result<Self, ApiError> {
        let key = CacheKey::suggest_week(limit);
        let (cached, ticket) = {
            let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
            (guard.get(&key).map(<[_]>::to_vec), guard.begin_fetch(key))
        };

        let items = match cached {
            Some(items) => items,
            None => {
                let items = source.suggest_week(limit).await?;
                cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .complete_fetch(ticket, items.clone());
                items
            }
        };

        let mut plan = Self::new(items);
        plan.cache = Some(cache);
        Ok(plan)
    }

    pub fn suggestions(&self) -> &[RecommendationItem] {
        &self.items
    }

    pub fn is_selected(&self, task_id: &str) -> bool {
        self.selected.contains(task_id)
    }

    /// Flip one suggestion. Returns the new selection state, or `None` if `task_id` is not suggested.
    pub fn toggle(&mut self, task_id: &str) -> Option<bool> {
        let selected = !self.is_selected(task_id);
        self.set_selected(task_id, selected).then_some(selected)
    }

    /// Returns false if `task_id` is not one of the suggestions.
    pub fn set_selected(&mut self, task_id: &str, selected: bool) -> bool {
        if !self.items.iter().any(|item| item.task.id == task_id) {
            return false;
        }
        if selected {
            self.selected.insert(task_id.to_string());
        } else {
            self.selected.remove(task_id);
        }
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.items.iter().map(|item| item.task.id.clone()).collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Selected task ids in suggestion order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| self.selected.contains(&item.task.id))
            .map(|item| item.task.id.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Promote the selection into this week. Returns how many tasks moved.
    ///
    /// With nothing selected no request is made.
    pub async fn confirm<M: TaskMutator>(&self, mutator: &M) -> Result<usize, ApiError> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            tracing::debug!("week plan confirmed with no selection");
            return Ok(0);
        }

        let moved = mutator.promote_tasks_to_week(&ids).await?;
        tracing::info!(selected = ids.len(), moved, "week plan confirmed");

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .invalidate(|key| matches!(key.mode(), CacheMode::Passive | CacheMode::SuggestWeek));
        }
        Ok(moved)
    }
}
