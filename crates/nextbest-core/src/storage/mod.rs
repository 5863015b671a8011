mod config;

pub use config::{ApiConfig, Config, RecommendationsConfig, API_URL_ENV, DEFAULT_BASE_URL};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nextbest[-dev]/` based on NEXTBEST_ENV.
///
/// Set NEXTBEST_ENV=dev to use the development config directory.
///
/// # Errors
/// Returns an error if there is no home directory or creating the config
/// directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir().ok_or(ConfigError::NoConfigDir)?.join(".config");

    let env = std::env::var("NEXTBEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("nextbest-dev")
    } else {
        base_dir.join("nextbest")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
