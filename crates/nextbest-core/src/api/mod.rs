//! Backend API: recommendation fetches and task mutations.
//!
//! [`ApiClient`] talks HTTP. The rest of the core only sees the
//! [`RecommendationSource`] and [`TaskMutator`] traits, so wizard and feed
//! logic can be driven by in-memory fakes in tests.

pub mod client;
pub mod recommendations;
pub mod tasks;

#[cfg(test)]
mod recommendations_tests;

use std::future::Future;

pub use client::ApiClient;
pub use recommendations::{
    items_from_body, EnergyLevel, NextQuery, RecommendationItem, TimeWindow, DEFAULT_LIST_LIMIT,
    DEFAULT_NEXT_LIMIT, DEFAULT_WEEK_LIMIT,
};

use crate::error::ApiError;
use crate::task::{Task, TaskStatus};

/// Anything that can produce ranked recommendations.
pub trait RecommendationSource: Send + Sync {
    /// Passive feed of up to `limit` items.
    fn list_recommendations(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RecommendationItem>, ApiError>> + Send;

    /// Items filtered by the user's energy and available time.
    fn get_next_recommendations(
        &self,
        query: &NextQuery,
    ) -> impl Future<Output = Result<Vec<RecommendationItem>, ApiError>> + Send;

    /// Batch suggestion for the coming week.
    fn suggest_week(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RecommendationItem>, ApiError>> + Send;
}

/// Task writes the recommendation layer triggers.
pub trait TaskMutator: Send + Sync {
    fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Option<Task>, ApiError>> + Send;

    fn promote_tasks_to_week(
        &self,
        task_ids: &[String],
    ) -> impl Future<Output = Result<usize, ApiError>> + Send;
}

impl RecommendationSource for ApiClient {
    async fn list_recommendations(&self, limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
        ApiClient::list_recommendations(self, limit).await
    }

    async fn get_next_recommendations(
        &self,
        query: &NextQuery,
    ) -> Result<Vec<RecommendationItem>, ApiError> {
        ApiClient::get_next_recommendations(self, query).await
    }

    async fn suggest_week(&self, limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
        ApiClient::suggest_week(self, limit).await
    }
}

impl TaskMutator for ApiClient {
    async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, ApiError> {
        ApiClient::update_task_status(self, task_id, status).await
    }

    async fn promote_tasks_to_week(&self, task_ids: &[String]) -> Result<usize, ApiError> {
        ApiClient::promote_tasks_to_week(self, task_ids).await
    }
}
