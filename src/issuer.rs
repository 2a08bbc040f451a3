//! Per-day signed URL issuance.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::sas::{SasPolicy, DEFAULT_CLOCK_SKEW_MINUTES, MAX_SAS_ACTIVE_TIME_IN_HRS};
use crate::storage::BlobStore;
use crate::validator::FeedRequest;

/// Default number of existence probes in flight per request.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 4;

const NOT_FOUND_PREFIX: &str = "Blob not found for the date: ";

/// Path of the blob holding `feed` for `partner` on `day`, relative to the
/// container.
///
/// The month is zero-padded, the day is not:
///
/// ```
/// use chrono::NaiveDate;
/// use feed_access::blob_path;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(blob_path("TargetBase", "client", day), "TargetBase/client/2024/01/5/client.csv");
/// ```
pub fn blob_path(partner: &str, feed: &str, day: NaiveDate) -> String {
    format!(
        "{partner}/{feed}/{}/{:02}/{}/{feed}.csv",
        day.year(),
        day.month(),
        day.day()
    )
}

/// Entry returned in place of a URL when no blob exists for `day`.
pub fn not_found_sentinel(day: NaiveDate) -> String {
    format!("{NOT_FOUND_PREFIX}{}", day.format("%Y-%m-%d"))
}

/// Returns the date named by a not-found entry, or `None` for a URL.
pub fn parse_not_found_sentinel(entry: &str) -> Option<NaiveDate> {
    entry
        .strip_prefix(NOT_FOUND_PREFIX)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

/// Probes each requested day and signs a read URL for the days that exist.
#[derive(Clone)]
pub struct SignedUrlIssuer {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    clock_skew: Duration,
    concurrency: usize,
}

impl SignedUrlIssuer {
    /// Creates an issuer with the default clock skew and probe concurrency.
    pub fn new(store: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            clock_skew: Duration::minutes(DEFAULT_CLOCK_SKEW_MINUTES),
            concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }

    /// Sets how far signatures are back-dated.
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Sets the number of probes in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns one entry per day of `request`, in ascending date order.
    ///
    /// Each entry is either a signed URL valid for `sas_active_time_in_hrs`
    /// hours (capped at [`MAX_SAS_ACTIVE_TIME_IN_HRS`]) or a
    /// [not-found sentinel](not_found_sentinel). A range where every day is
    /// missing still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] for the first day whose probe or
    /// signature fails. Nothing is retried.
    pub async fn issue(
        &self,
        request: &FeedRequest,
        sas_active_time_in_hrs: u32,
    ) -> Result<Vec<String>> {
        let hours = sas_active_time_in_hrs.min(MAX_SAS_ACTIVE_TIME_IN_HRS);
        let active = Duration::hours(i64::from(hours));
        let partner = request.partner().as_str();
        let feed = request.feed_name();

        stream::iter(request.days())
            .map(|day| self.issue_day(partner, feed, day, active))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn issue_day(
        &self,
        partner: &str,
        feed: &str,
        day: NaiveDate,
        active: Duration,
    ) -> Result<String> {
        let path = blob_path(partner, feed, day);

        let exists = self
            .store
            .exists(&path)
            .await
            .map_err(|source| Error::StorageUnavailable {
                path: path.clone(),
                source,
            })?;

        if !exists {
            debug!(%path, "blob missing");
            return Ok(not_found_sentinel(day));
        }

        let policy = SasPolicy::read_only(self.clock.now_utc(), active, self.clock_skew);
        let query = self
            .store
            .signed_query(&path, &policy)
            .map_err(|source| Error::StorageUnavailable {
                path: path.clone(),
                source,
            })?;

        Ok(format!("{}{}", self.store.blob_url(&path), query))
    }
}

impl fmt::Debug for SignedUrlIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedUrlIssuer")
            .field("container", &self.store.container())
            .field("clock_skew", &self.clock_skew)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
