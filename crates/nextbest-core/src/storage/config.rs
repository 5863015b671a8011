//! TOML-based client configuration.
//!
//! Stores:
//! - Backend base URL
//! - Default list sizes for each recommendation mode
//!
//! Configuration is stored at `~/.config/nextbest/config.toml`. The
//! `NEXTBEST_API_URL` environment variable overrides the stored base URL.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::api::{DEFAULT_LIST_LIMIT, DEFAULT_NEXT_LIMIT, DEFAULT_WEEK_LIMIT};
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const API_URL_ENV: &str = "NEXTBEST_API_URL";

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Default `limit` per recommendation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
    #[serde(default = "default_next_limit")]
    pub next_limit: u32,
    #[serde(default = "default_week_limit")]
    pub week_limit: u32,
}

/// Client configuration.
///
/// Serialized to/from TOML at `~/.config/nextbest/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}
fn default_next_limit() -> u32 {
    DEFAULT_NEXT_LIMIT
}
fn default_week_limit() -> u32 {
    DEFAULT_WEEK_LIMIT
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            next_limit: DEFAULT_NEXT_LIMIT,
            week_limit: DEFAULT_WEEK_LIMIT,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if part.is_empty() {
                return Err(unknown());
            }
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot overwrite a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file in the user's config directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the persisted config from the default location, writing
    /// defaults on first run. Environment overrides are not applied, so the
    /// result is safe to modify and save back.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load the config the process should run with: the persisted file
    /// plus environment overrides. Never save the result.
    pub fn load_effective() -> Result<Self, ConfigError> {
        Self::load_effective_from(&Self::path()?)
    }

    pub fn load_effective_from(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = Self::load_from(path)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load from `path`, creating it with defaults when missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Replace the base URL with `NEXTBEST_API_URL` when it is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                tracing::debug!(base_url = url, "base URL overridden from environment");
                self.api.base_url = url.to_string();
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All leaf keys with their current values, in file order.
    pub fn entries(&self) -> Vec<(String, String)> {
        [
            "api.base_url",
            "recommendations.list_limit",
            "recommendations.next_limit",
            "recommendations.week_limit",
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
        .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })?;

        let limits = [
            ("recommendations.list_limit", self.recommendations.list_limit),
            ("recommendations.next_limit", self.recommendations.next_limit),
            ("recommendations.week_limit", self.recommendations.week_limit),
        ];
        for (key, limit) in limits {
            if limit == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "limit must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    /// Effective config, or defaults (still with environment overrides)
    /// when the file cannot be read.
    pub fn load_or_default() -> Self {
        Self::load_effective().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            let mut cfg = Self::default();
            cfg.apply_env_overrides();
            cfg
        })
    }
}
