//! Version oracle: resolves the remote dataset revision.

use std::time::Duration;

use crate::errors::AppError;
use crate::models::{CachedResponse, VersionToken};

use super::fetch_success;

/// Client for the version-check endpoint.
///
/// A single bounded request per call; retry policy belongs to the caller.
#[derive(Clone)]
pub struct VersionOracle {
    client: reqwest::Client,
    url: String,
    field: String,
    timeout: Duration,
}

impl VersionOracle {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        field: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            field: field.into(),
            timeout,
        }
    }

    /// Fetch the current remote version token.
    pub async fn fetch_remote_version(&self) -> Result<VersionToken, AppError> {
        let response = self.check().await?;
        self.token_from_response(&response)
    }

    /// Perform the version-check request and return the raw response.
    pub async fn check(&self) -> Result<CachedResponse, AppError> {
        fetch_success(&self.client, &self.url, self.timeout).await
    }

    /// Resolve the token carried by a version-check response.
    pub fn token_from_response(&self, response: &CachedResponse) -> Result<VersionToken, AppError> {
        let body: serde_json::Value = serde_json::from_slice(&response.body).map_err(|e| {
            AppError::Network(format!("Version response from {} is not JSON: {}", self.url, e))
        })?;

        body.get(&self.field)
            .and_then(|v| v.as_str())
            .map(VersionToken::new)
            .ok_or_else(|| {
                AppError::Network(format!(
                    "Version response from {} has no string field '{}'",
                    self.url, self.field
                ))
            })
    }
}
