//! Task mutation endpoints.

use reqwest::Method;
use serde_json::{json, Value};

use super::client::ApiClient;
use crate::error::ApiError;
use crate::task::{Task, TaskStatus};

const PROMOTE_WEEK_PATH: &str = "/tasks/promote-week";

impl ApiClient {
    /// `PATCH /tasks/{id} {"status": ...}`.
    ///
    /// Any 2xx counts as success. The server's copy of the task is returned
    /// when the body carries one; an empty or differently shaped body (204,
    /// `{"ok": true}`) yields `None`.
    pub async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, ApiError> {
        let path = format!("/tasks/{}", urlencoding::encode(task_id));
        let body = self
            .send_json(Method::PATCH, &path, &json!({ "status": status }))
            .await?;
        Ok(task_from_body(body, &path))
    }

    /// `POST /tasks/promote-week {"task_ids": [...]}`, returning how many moved.
    pub async fn promote_tasks_to_week(&self, task_ids: &[String]) -> Result<usize, ApiError> {
        let body = self
            .send_json(Method::POST, PROMOTE_WEEK_PATH, &json!({ "task_ids": task_ids }))
            .await?;
        Ok(moved_count(&body, task_ids.len()))
    }
}

fn task_from_body(body: Value, endpoint: &str) -> Option<Task> {
    if body.is_null() {
        return None;
    }
    match serde_json::from_value(body) {
        Ok(task) => Some(task),
        Err(e) => {
            tracing::debug!(endpoint, error = %e, "status change accepted without a task body");
            None
        }
    }
}

/// Servers that answer without a `moved` count are assumed to have moved everything.
fn moved_count(body: &Value, requested: usize) -> usize {
    body.get("moved")
        .and_then(Value::as_u64)
        .map_or(requested, |n| n as usize)
}
