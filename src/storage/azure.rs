use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use reqwest::StatusCode;
use tracing::debug;

use super::{BlobStore, StorageError};
use crate::clock::{Clock, SystemClock};
use crate::config::StorageConfig;
use crate::sas::{SasPolicy, SharedKeySigner, DEFAULT_CLOCK_SKEW_MINUTES};

/// How long the signature used for an existence probe stays valid.
const PROBE_SIGNATURE_MINUTES: i64 = 5;

/// Azure Blob Storage container accessed with a shared account key.
///
/// Existence is probed with a `HEAD` request on a short-lived read SAS URL,
/// so the account key never leaves the process.
pub struct AzureBlobStore {
    client: reqwest::Client,
    base_url: String,
    container: String,
    signer: SharedKeySigner,
    clock: Arc<dyn Clock>,
}

impl AzureBlobStore {
    /// Creates a store for the container described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidCredential`] if the account key is not
    /// valid base64, or [`StorageError::Transport`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let signer = SharedKeySigner::new(&config.account_name, &config.account_key)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            container: config.container.clone(),
            signer,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used for probe signatures.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn probe_policy(&self) -> SasPolicy {
        SasPolicy::read_only(
            self.clock.now_utc(),
            Duration::minutes(PROBE_SIGNATURE_MINUTES),
            Duration::minutes(DEFAULT_CLOCK_SKEW_MINUTES),
        )
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn container(&self) -> &str {
        &self.container
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let query = self.signed_query(path, &self.probe_policy())?;
        let url = format!("{}{}", self.blob_url(path), query);

        let response = self.client.head(&url).send().await?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "probed blob");

        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(StorageError::UnexpectedStatus {
                status: other.as_u16(),
            }),
        }
    }

    fn signed_query(&self, path: &str, policy: &SasPolicy) -> Result<String, StorageError> {
        self.signer.sign(&self.container, path, policy)
    }
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("base_url", &self.base_url)
            .field("container", &self.container)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
