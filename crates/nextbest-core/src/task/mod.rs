//! Task types as the backend serves them.
//!
//! The core never owns tasks. A [`Task`] here is a read snapshot embedded in a
//! recommendation; the only local write is the optimistic status overwrite
//! applied by the recommendation cache.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Board bucket a task lives in.
///
/// Ordered the way the board renders its columns, from untriaged to finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Inbox,
    Backlog,
    Week,
    Today,
    Todo,
    Doing,
    Waiting,
    Done,
}

impl TaskStatus {
    /// Every status in board order.
    pub const ALL: [TaskStatus; 8] = [
        TaskStatus::Inbox,
        TaskStatus::Backlog,
        TaskStatus::Week,
        TaskStatus::Today,
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::Waiting,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Inbox => "inbox",
            TaskStatus::Backlog => "backlog",
            TaskStatus::Week => "week",
            TaskStatus::Today => "today",
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

/// A task snapshot.
///
/// Nullable fields tolerate being absent as well as `null`. Timestamps are
/// kept exactly as the server sent them; use [`parse_timestamp`] or the
/// typed accessors to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier, immutable once assigned
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    /// Position within the status bucket
    #[serde(default)]
    pub sort_order: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    /// Deadline that must not slip
    #[serde(default)]
    pub hard_due_at: Option<String>,
    /// Target date that may slip
    #[serde(default)]
    pub soft_due_at: Option<String>,
    /// Estimate in minutes; servers may send fractions
    #[serde(default)]
    pub effort_minutes: Option<f64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Task {
    /// Whether the task fits inside a window of `minutes`.
    ///
    /// Tasks without an estimate are assumed to fit.
    pub fn fits_within(&self, minutes: u32) -> bool {
        self.effort_minutes
            .map_or(true, |effort| effort <= f64::from(minutes))
    }

    pub fn hard_due(&self) -> Option<DateTime<Utc>> {
        self.hard_due_at.as_deref().and_then(parse_timestamp)
    }

    pub fn soft_due(&self) -> Option<DateTime<Utc>> {
        self.soft_due_at.as_deref().and_then(parse_timestamp)
    }

    /// The earlier of the two due dates, if any parse.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        match (self.hard_due(), self.soft_due()) {
            (Some(hard), Some(soft)) => Some(hard.min(soft)),
            (hard, soft) => hard.or(soft),
        }
    }
}

/// Read an ISO 8601 timestamp. Offsets are honoured; a timestamp without
/// one (`2024-01-01T09:00:00`) is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
