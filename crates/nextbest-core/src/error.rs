//! Core error types for nextbest-core.
//!
//! This module defines the error hierarchy using thiserror. Malformed
//! recommendation bodies never become errors (they normalize to an empty
//! list); only transport and server failures do.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nextbest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Backend API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while talking to the task backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A response that must carry a specific shape (e.g. an updated task) did not.
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid API base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
}

/// Recommendation cache errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Another optimistic patch on the same task has not settled yet.
    #[error("An optimistic update for task '{task_id}' is still pending")]
    PatchOutstanding { task_id: String },

    /// The rollback token does not belong to this cache.
    #[error("Unknown rollback token #{token_id} for task '{task_id}'")]
    UnknownToken { token_id: u64, task_id: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No home/config directory could be resolved
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Time windows are positive minute counts
    #[error("Time window must be a positive number of minutes, got {0}")]
    InvalidTimeWindow(i64),

    /// Energy outside low/medium/high
    #[error("Unknown energy level '{0}' (expected low, medium or high)")]
    InvalidEnergy(String),

    /// Status outside the fixed task status set
    #[error("Unknown task status '{0}'")]
    InvalidStatus(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_endpoint_and_code() {
        let err = ApiError::Status {
            endpoint: "/recommendations/next".into(),
            status: 503,
            body: "unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/recommendations/next"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn config_and_api_errors_convert_into_core_error() {
        let err: CoreError = ConfigError::NoConfigDir.into();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("configuration directory"));

        let err: CoreError = ApiError::InvalidBaseUrl {
            url: "nope".into(),
            message: "relative URL without a base".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api(_)));
    }
}
