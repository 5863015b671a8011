//! HTTP client for the task backend.

use reqwest::{Client, Method, Response};
use serde_json::Value;
use url::Url;

use std::path::Path;

use crate::error::{ApiError, Result};
use crate::storage::Config;

/// Thin wrapper over a shared `reqwest::Client` bound to one API base URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000/api/v1`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "URL cannot be used as a base".into(),
            });
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            http_client: Client::new(),
        })
    }

    /// Create a client from the `[api]` section of the user config.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api.base_url)
    }

    /// Load the effective user config and build a client for it.
    pub fn from_user_config() -> Result<(Self, Config)> {
        Self::from_config_file(&Config::path()?)
    }

    pub fn from_config_file(path: &Path) -> Result<(Self, Config)> {
        let config = Config::load_effective_from(path)?;
        let client = Self::from_config(&config)?;
        Ok((client, config))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                message: e.to_string(),
            })
    }

    /// `GET path?query`, returning the body as loose JSON.
    pub(crate) async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, ?query, "GET");

        let resp = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        read_json(path, resp).await
    }

    /// Send `body` as JSON with `method`, returning the body as loose JSON.
    pub(crate) async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "sending JSON body");

        let resp = self
            .http_client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        read_json(path, resp).await
    }
}

/// Map non-2xx to [`ApiError::Status`]; a 2xx body that is not JSON becomes `Null`.
async fn read_json(endpoint: &str, resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|source| ApiError::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::debug!(endpoint, error = %e, "response body is not JSON");
            Ok(Value::Null)
        }
    }
}
