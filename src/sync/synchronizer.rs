//! Dataset synchronizer.
//!
//! Keeps the stored dataset text in step with the remote version token.
//! Write ordering: the dataset blob is always written before the token
//! that vouches for it, so an interrupted refresh reads as stale on the
//! next run and never as fresh.

use std::time::Duration;

use crate::config::Config;
use crate::db::BlobStore;
use crate::errors::AppError;
use crate::models::VersionToken;
use crate::remote::{fetch_success, VersionOracle};

use super::extract_first_entry_text;

/// Blob store bucket owned by the synchronizer.
pub const SYNC_BUCKET: &str = "sync";
/// Reserved key holding the stored version token.
pub const VERSION_KEY: &str = "version";
/// Reserved key holding the decoded dataset text.
pub const DATASET_KEY: &str = "dataset";

/// How a sync run obtained its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPath {
    /// Stored token matched the remote one; stored text returned.
    Fresh,
    /// Stored token missing or different; archive downloaded.
    Refreshed,
    /// Staleness check failed; unconditional full refresh succeeded.
    Recovered,
}

/// Outcome of a successful sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub text: String,
    pub path: SyncPath,
}

/// Orchestrates the version oracle, blob store and archive extractor.
#[derive(Clone)]
pub struct DatasetSynchronizer {
    store: BlobStore,
    oracle: VersionOracle,
    client: reqwest::Client,
    archive_url: String,
    archive_timeout: Duration,
}

impl DatasetSynchronizer {
    pub fn new(
        store: BlobStore,
        oracle: VersionOracle,
        client: reqwest::Client,
        archive_url: impl Into<String>,
        archive_timeout: Duration,
    ) -> Self {
        Self {
            store,
            oracle,
            client,
            archive_url: archive_url.into(),
            archive_timeout,
        }
    }

    /// Wire a synchronizer from application configuration.
    pub fn from_config(config: &Config, store: BlobStore, client: reqwest::Client) -> Self {
        let oracle = VersionOracle::new(
            client.clone(),
            &config.version_url,
            &config.version_field,
            config.version_timeout,
        );
        Self::new(
            store,
            oracle,
            client,
            &config.dataset_url,
            config.archive_timeout,
        )
    }

    /// Return dataset text matching the latest remote version.
    ///
    /// Fails only with `DatasetUnavailable`, when neither the stored copy
    /// nor a full refresh can produce a dataset.
    pub async fn ensure_fresh_dataset(&self) -> Result<String, AppError> {
        self.sync().await.map(|report| report.text)
    }

    /// Like [`ensure_fresh_dataset`](Self::ensure_fresh_dataset), reporting which path was taken.
    pub async fn sync(&self) -> Result<SyncReport, AppError> {
        let mut remote = None;
        match self.check_and_load(&mut remote).await {
            Ok(report) => return Ok(report),
            Err(e) => tracing::warn!("No usable local dataset, refreshing: {}", e),
        }

        match self.refresh(remote.as_ref()).await {
            Ok(text) => Ok(SyncReport {
                text,
                path: SyncPath::Recovered,
            }),
            Err(e) => {
                tracing::error!("Dataset refresh failed: {}", e);
                Err(AppError::DatasetUnavailable(format!(
                    "Unable to obtain dataset: {}",
                    e
                )))
            }
        }
    }

    /// Staleness check plus the fresh or stale path. A resolved remote
    /// token is left in `remote` for the fallback.
    async fn check_and_load(
        &self,
        remote: &mut Option<VersionToken>,
    ) -> Result<SyncReport, AppError> {
        let remote_token = self.oracle.fetch_remote_version().await?;
        *remote = Some(remote_token.clone());

        let local_token = match self.store.get_text(VERSION_KEY).await {
            Ok(token) => Some(VersionToken::new(token)),
            Err(AppError::StorageMiss(_)) => None,
            Err(e) => return Err(e),
        };

        if local_token.as_ref() == Some(&remote_token) {
            tracing::debug!("Dataset is fresh at version {}", remote_token);
            let text = self.store.get_text(DATASET_KEY).await?;
            return Ok(SyncReport {
                text,
                path: SyncPath::Fresh,
            });
        }

        tracing::info!(
            "Dataset is stale (local {:?}, remote {}), downloading",
            local_token.as_ref().map(VersionToken::as_str),
            remote_token
        );
        self.store.delete(DATASET_KEY).await?;
        let text = self.refresh(Some(&remote_token)).await?;
        Ok(SyncReport {
            text,
            path: SyncPath::Refreshed,
        })
    }

    /// Fetch, extract and store the dataset, then record `token`.
    ///
    /// Without a token the stored one is dropped first, so the new blob
    /// is never mistaken for a verified one.
    async fn refresh(&self, token: Option<&VersionToken>) -> Result<String, AppError> {
        let archive = fetch_success(&self.client, &self.archive_url, self.archive_timeout).await?;
        tracing::info!("Downloaded dataset archive ({} bytes)", archive.body.len());

        let text =
            tokio::task::spawn_blocking(move || extract_first_entry_text(&archive.body)).await??;

        if token.is_none() {
            self.store.delete(VERSION_KEY).await?;
        }
        self.store.put(DATASET_KEY, text.as_bytes()).await?;
        if let Some(token) = token {
            self.store.put(VERSION_KEY, token.as_str().as_bytes()).await?;
            tracing::info!("Stored dataset at version {}", token);
        } else {
            tracing::warn!("Stored dataset without a version token; next run will refresh");
        }

        Ok(text)
    }

    /// Currently stored version token and dataset size, if any.
    pub async fn stored_state(&self) -> Result<(Option<VersionToken>, Option<i64>), AppError> {
        let version = match self.store.get_text(VERSION_KEY).await {
            Ok(token) => Some(VersionToken::new(token)),
            Err(AppError::StorageMiss(_)) => None,
            Err(e) => return Err(e),
        };
        let size = self.store.size(DATASET_KEY).await?;
        Ok((version, size))
    }
}
