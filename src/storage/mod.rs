//! Object storage capability used by the URL issuer.
//!
//! The issuer needs exactly two things from storage: whether a blob exists
//! and a signed query string granting read access to it. Backends:
//! - [`AzureBlobStore`]: Azure Blob Storage over HTTPS with shared-key SAS signing
//! - [`MemoryBlobStore`]: in-process set of paths for tests and local runs

mod azure;
mod memory;

use async_trait::async_trait;

use crate::sas::SasPolicy;

pub use azure::AzureBlobStore;
pub use memory::MemoryBlobStore;

/// Errors reported by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The configured credential cannot be used
    #[error("invalid storage credential: {0}")]
    InvalidCredential(String),

    /// Signing the URL failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// The store answered with a status that is neither found nor not-found
    #[error("unexpected storage response status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the store
        status: u16,
    },

    /// The store could not be reached
    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Generic backend failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Existence probing and URL signing against one container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Base endpoint, e.g. `https://account.blob.core.windows.net`.
    fn base_url(&self) -> &str;

    /// Container holding the partner feeds.
    fn container(&self) -> &str;

    /// Returns whether a blob exists at `path` (relative to the container).
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Returns the signed query string (starting with `?`) for `path`.
    fn signed_query(&self, path: &str, policy: &SasPolicy) -> Result<String, StorageError>;

    /// Unsigned URL of the blob at `path`.
    fn blob_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url().trim_end_matches('/'),
            self.container(),
            path
        )
    }
}
