//! Recommendation endpoints and their wire types.
//!
//! Every fetch normalizes a malformed-but-successful body into an empty list,
//! so callers only ever branch on "items" vs "transport failure".

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::task::Task;

/// Default size of the passive feed.
pub const DEFAULT_LIST_LIMIT: u32 = 10;
/// Default size of an energy/time filtered fetch.
pub const DEFAULT_NEXT_LIMIT: u32 = 5;
/// Default size of the weekly batch.
pub const DEFAULT_WEEK_LIMIT: u32 = 5;

const NEXT_PATH: &str = "/recommendations/next";
const SUGGEST_WEEK_PATH: &str = "/recommendations/suggest-week";

/// A ranked task suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub task: Task,
    /// Higher is more recommended; unbounded.
    pub score: f64,
    /// Per-factor contributions, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<BTreeMap<String, f64>>,
    /// Human-readable justification.
    #[serde(default)]
    pub why: String,
}

impl RecommendationItem {
    pub fn task_id(&self) -> &str {
        &self.task.id
    }
}

/// How much energy the user has right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 3] = [EnergyLevel::Low, EnergyLevel::Medium, EnergyLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "Low",
            EnergyLevel::Medium => "Medium",
            EnergyLevel::High => "High",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "Need something easy",
            EnergyLevel::Medium => "Ready for a challenge",
            EnergyLevel::High => "Firing on all cylinders",
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Ok(EnergyLevel::Low),
            "medium" | "med" | "m" => Ok(EnergyLevel::Medium),
            "high" | "h" => Ok(EnergyLevel::High),
            _ => Err(ValidationError::InvalidEnergy(s.to_string())),
        }
    }
}

/// Available time in minutes. Always positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "u32")]
pub struct TimeWindow(u32);

impl TimeWindow {
    /// The wizard's fixed menu.
    pub const MENU: [TimeWindow; 5] = [
        TimeWindow(15),
        TimeWindow(30),
        TimeWindow(60),
        TimeWindow(120),
        TimeWindow(240),
    ];

    pub fn new(minutes: i64) -> Result<Self, ValidationError> {
        if minutes <= 0 || minutes > i64::from(u32::MAX) {
            return Err(ValidationError::InvalidTimeWindow(minutes));
        }
        Ok(TimeWindow(minutes as u32))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Menu label, e.g. `1h` or `4h+`.
    pub fn label(&self) -> String {
        match self.0 {
            240 => "4h+".to_string(),
            m if m % 60 == 0 => format!("{}h", m / 60),
            m => format!("{m}m"),
        }
    }
}

impl TryFrom<i64> for TimeWindow {
    type Error = ValidationError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        TimeWindow::new(minutes)
    }
}

impl From<TimeWindow> for u32 {
    fn from(window: TimeWindow) -> Self {
        window.0
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = ValidationError;

    /// Accepts plain minutes (`90`), `45m`, `2h` and the menu label `4h+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_lowercase();
        let invalid = || ValidationError::InvalidValue {
            field: "time_window".into(),
            message: format!("cannot parse '{s}' as minutes"),
        };
        let minutes = if let Some(hours) = raw.strip_suffix("h+").or_else(|| raw.strip_suffix('h')) {
            hours
                .parse::<i64>()
                .ok()
                .and_then(|h| h.checked_mul(60))
                .ok_or_else(invalid)?
        } else {
            raw.strip_suffix('m')
                .unwrap_or(&raw)
                .parse::<i64>()
                .map_err(|_| invalid())?
        };
        TimeWindow::new(minutes)
    }
}

/// Parameters of the energy/time filtered fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NextQuery {
    pub energy: EnergyLevel,
    pub time_window: TimeWindow,
    pub limit: u32,
}

impl NextQuery {
    pub fn new(energy: EnergyLevel, time_window: TimeWindow) -> Self {
        Self {
            energy,
            time_window,
            limit: DEFAULT_NEXT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn query_params(&self) -> [(&'static str, String); 3] {
        [
            ("energy", self.energy.as_str().to_string()),
            ("time_window", self.time_window.minutes().to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Extract the `items` list from a response body.
///
/// Anything other than an object with an `items` array yields an empty list.
/// Array elements that do not decode are skipped; the rest keep server order.
pub fn items_from_body(body: &Value) -> Vec<RecommendationItem> {
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        tracing::debug!("response has no items array, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            match RecommendationItem::deserialize(raw) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping malformed recommendation");
                    None
                }
            }
        })
        .collect()
}

impl ApiClient {
    /// Passive feed: `GET /recommendations/next?limit=N`.
    pub async fn list_recommendations(&self, limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
        let body = self
            .get_json(NEXT_PATH, &[("limit", limit.to_string())])
            .await?;
        Ok(items_from_body(&body))
    }

    /// Energy/time filtered fetch on the same endpoint.
    pub async fn get_next_recommendations(
        &self,
        query: &NextQuery,
    ) -> Result<Vec<RecommendationItem>, ApiError> {
        let body = self.get_json(NEXT_PATH, &query.query_params()).await?;
        Ok(items_from_body(&body))
    }

    /// Weekly batch: `POST /recommendations/suggest-week {"limit": N}`.
    pub async fn suggest_week(&self, limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
        let body = self
            .send_json(Method::POST, SUGGEST_WEEK_PATH, &json!({ "limit": limit }))
            .await?;
        Ok(items_from_body(&body))
    }
}
