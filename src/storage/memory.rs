use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{BlobStore, StorageError};
use crate::sas::SasPolicy;

const SAS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// In-memory blob store.
///
/// Holds a set of existing paths, counts calls, and can be told to fail for
/// specific paths. Signed query strings are deterministic and unsigned:
/// `?se=<expiry>&sp=r&sig=memory`.
///
/// # Examples
///
/// ```
/// # futures::executor::block_on(async {
/// use feed_access::{BlobStore, MemoryBlobStore};
///
/// let store = MemoryBlobStore::new("https://feeds.example.com", "partners")
///     .with_object("TargetBase/client/2024/01/5/client.csv");
///
/// assert!(store.exists("TargetBase/client/2024/01/5/client.csv").await.unwrap());
/// assert!(!store.exists("TargetBase/client/2024/01/6/client.csv").await.unwrap());
/// assert_eq!(store.probe_count(), 2);
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    container: String,
    objects: RwLock<HashSet<String>>,
    failing: RwLock<HashSet<String>>,
    probes: AtomicUsize,
    signatures: AtomicUsize,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new(base_url: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            container: container.into(),
            objects: RwLock::new(HashSet::new()),
            failing: RwLock::new(HashSet::new()),
            probes: AtomicUsize::new(0),
            signatures: AtomicUsize::new(0),
        }
    }

    /// Adds an object at `path`.
    pub fn with_object(self, path: impl Into<String>) -> Self {
        self.insert(path);
        self
    }

    /// Makes every probe of `path` fail.
    pub fn with_failure(self, path: impl Into<String>) -> Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(path.into());
        }
        self
    }

    /// Adds an object at `path`.
    pub fn insert(&self, path: impl Into<String>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(path.into());
        }
    }

    /// Removes the object at `path`.
    pub fn remove(&self, path: &str) {
        if let Ok(mut objects) = self.objects.write() {
            objects.remove(path);
        }
    }

    /// Number of existence probes served so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of signed query strings produced so far.
    pub fn signature_count(&self) -> usize {
        self.signatures.load(Ordering::SeqCst)
    }

    fn poisoned() -> StorageError {
        StorageError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn container(&self) -> &str {
        &self.container
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        if self.failing.read().map_err(|_| Self::poisoned())?.contains(path) {
            return Err(StorageError::Unavailable(format!("injected failure for {path}")));
        }

        Ok(self.objects.read().map_err(|_| Self::poisoned())?.contains(path))
    }

    fn signed_query(&self, _path: &str, policy: &SasPolicy) -> Result<String, StorageError> {
        self.signatures.fetch_add(1, Ordering::SeqCst);

        Ok(format!(
            "?se={}&sp={}&sig=memory",
            policy.valid_until.format(SAS_TIME_FORMAT),
            policy.permission.as_str()
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[tokio::test]
    async fn tracks_objects_and_probes() {
        let store = MemoryBlobStore::new("https://feeds.example.com", "partners")
            .with_object("a.csv");

        assert!(store.exists("a.csv").await.unwrap());
        store.remove("a.csv");
        assert!(!store.exists("a.csv").await.unwrap());
        store.insert("b.csv");
        assert!(store.exists("b.csv").await.unwrap());
        assert_eq!(store.probe_count(), 3);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = MemoryBlobStore::new("https://feeds.example.com", "partners")
            .with_object("a.csv")
            .with_failure("a.csv");

        let err = store.exists("a.csv").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn signed_query_carries_expiry() {
        let store = MemoryBlobStore::new("https://feeds.example.com/", "partners");
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let policy = SasPolicy::read_only(now, Duration::hours(8), Duration::minutes(5));

        let query = store.signed_query("a.csv", &policy).unwrap();

        assert_eq!(query, "?se=2024-01-05T20:00:00Z&sp=r&sig=memory");
        assert_eq!(store.signature_count(), 1);
        assert_eq!(store.blob_url("a.csv"), "https://feeds.example.com/partners/a.csv");
    }
}
