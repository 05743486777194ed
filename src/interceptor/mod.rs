//! Update-aware request interceptor.
//!
//! Answers fetches cache-first. Requests for the dataset URL first run an
//! independent version check and swap in fresh content when the remote
//! version moved. The version check never fails a request: any error in it
//! degrades to the plain cache-first policy.

use std::time::Duration;

use crate::config::Config;
use crate::db::ResponseCache;
use crate::errors::AppError;
use crate::models::{CachedResponse, VersionToken};
use crate::remote::{fetch_response, fetch_success, VersionOracle};

/// Response cache bucket owned by the interceptor.
pub const INTERCEPTOR_BUCKET: &str = "interceptor";
/// Synthetic cache key for the last-seen version-check response.
pub const VERSION_CHECK_KEY: &str = "interceptor:version-check";

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Dataset re-fetched because the remote version changed.
    Refreshed,
    /// Served from the cache bucket.
    Hit,
    /// Live network passthrough (not cached).
    Network,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Refreshed => "refreshed",
            CacheOutcome::Hit => "hit",
            CacheOutcome::Network => "network",
        }
    }
}

/// An answered request.
#[derive(Debug, Clone)]
pub struct Intercepted {
    pub response: CachedResponse,
    pub outcome: CacheOutcome,
}

/// Background request interceptor with its own cache bucket.
pub struct Interceptor {
    cache: ResponseCache,
    oracle: VersionOracle,
    client: reqwest::Client,
    dataset_url: String,
    fetch_timeout: Duration,
}

impl Interceptor {
    pub fn new(
        cache: ResponseCache,
        oracle: VersionOracle,
        client: reqwest::Client,
        dataset_url: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            oracle,
            client,
            dataset_url: dataset_url.into(),
            fetch_timeout,
        }
    }

    /// Wire an interceptor from application configuration.
    pub fn from_config(config: &Config, cache: ResponseCache, client: reqwest::Client) -> Self {
        let oracle = VersionOracle::new(
            client.clone(),
            &config.version_url,
            &config.version_field,
            config.version_timeout,
        );
        Self::new(
            cache,
            oracle,
            client,
            &config.dataset_url,
            config.archive_timeout,
        )
    }

    /// Answer a request for `url`.
    pub async fn handle(&self, url: &str) -> Result<Intercepted, AppError> {
        if url == self.dataset_url {
            match self.refresh_if_stale(url).await {
                Ok(Some(response)) => {
                    return Ok(Intercepted {
                        response,
                        outcome: CacheOutcome::Refreshed,
                    })
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Version check for {} failed, serving cache: {}", url, e),
            }
        }

        self.cache_first(url).await
    }

    /// Fetch the dataset afresh if the cached version-check response is
    /// missing or resolves to a different token than the remote one.
    async fn refresh_if_stale(&self, url: &str) -> Result<Option<CachedResponse>, AppError> {
        let check = self.oracle.check().await?;
        let remote = self.oracle.token_from_response(&check)?;

        let cached = self.cached_token().await?;
        if cached.as_ref() == Some(&remote) {
            tracing::debug!("Cached dataset is current at version {}", remote);
            return Ok(None);
        }

        tracing::info!(
            "Dataset version changed ({:?} -> {}), refetching {}",
            cached.as_ref().map(VersionToken::as_str),
            remote,
            url
        );
        let fresh = fetch_success(&self.client, url, self.fetch_timeout).await?;

        // Dataset before the version marker that vouches for it.
        if let Err(e) = self.cache.put(url, &fresh).await {
            tracing::warn!("Failed to cache refreshed dataset: {}", e);
        } else if let Err(e) = self.cache.put(VERSION_CHECK_KEY, &check).await {
            tracing::warn!("Failed to cache version-check response: {}", e);
        }

        Ok(Some(fresh))
    }

    async fn cached_token(&self) -> Result<Option<VersionToken>, AppError> {
        let Some(cached) = self.cache.get(VERSION_CHECK_KEY).await? else {
            return Ok(None);
        };
        match self.oracle.token_from_response(&cached) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached version-check response: {}", e);
                Ok(None)
            }
        }
    }

    /// Serve from cache when present, else from the network.
    pub async fn cache_first(&self, url: &str) -> Result<Intercepted, AppError> {
        match self.cache.get(url).await {
            Ok(Some(response)) => {
                return Ok(Intercepted {
                    response,
                    outcome: CacheOutcome::Hit,
                })
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache lookup for {} failed: {}", url, e),
        }

        let response = fetch_response(&self.client, url, self.fetch_timeout).await?;
        Ok(Intercepted {
            response,
            outcome: CacheOutcome::Network,
        })
    }

    /// Fetch each URL into the cache bucket.
    ///
    /// Stops at the first URL that cannot be fetched with a success status.
    pub async fn precache(&self, urls: &[String]) -> Result<usize, AppError> {
        for url in urls {
            let response = fetch_success(&self.client, url, self.fetch_timeout).await?;
            self.cache.put(url, &response).await?;
        }
        tracing::info!("Pre-cached {} resources", urls.len());
        Ok(urls.len())
    }
}
