//! Time-limited signed URLs for partner data feeds.
//!
//! A partner asks for one feed over a range of days and gets back one entry
//! per day: a read-only signed URL when that day's file exists, or a
//! not-found marker naming the date. The pipeline:
//!
//! 1. [`AuthorizationResolver`] maps the authenticated principal to a partner
//! 2. [`RequestParameterValidator`] checks the feed and dates against the
//!    calendar and the partner's [`FeedEntitlementCatalog`]
//! 3. [`SignedUrlIssuer`] probes each day in the [`BlobStore`] and signs URLs
//! 4. [`FeedAccessOrchestrator`] ties them together; [`web::FeedUrlsHandler`]
//!    turns the result into an HTTP response
//!
//! # Core Types
//!
//! - [`Tainted<T>`]: request input that has not been sanitized
//! - [`Verified<T>`]: input that passed a [`Sanitizer`]
//! - [`Ctx`]: per-request context, `Ctx<Unauthed> → Ctx<Authed> → Ctx<Authorized>`
//! - [`Secret<T>`]: redacts the storage account key in logs and debug output
//! - [`FeedRequest`]: a request that passed every validation rule
//!
//! # Examples
//!
//! ```
//! # futures::executor::block_on(async {
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use feed_access::web::FeedUrlsHandler;
//! use feed_access::{FeedAccessOrchestrator, FixedClock, MemoryBlobStore, Principal, StaticLookup};
//!
//! let store = MemoryBlobStore::new("https://feeds.example.com", "partners")
//!     .with_object("TargetBase/patient/2024/01/9/patient.csv");
//!
//! let orchestrator = FeedAccessOrchestrator::new(
//!     Arc::new(StaticLookup::new().with("kevin@example.com", "TargetBase")),
//!     Arc::new(StaticLookup::new().with("TargetBase", "client,patient")),
//!     Arc::new(store),
//! )
//! .with_clock(Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap())));
//!
//! let response = FeedUrlsHandler::new(orchestrator)
//!     .respond(
//!         "req-1",
//!         Some(Principal::authenticated("kevin@example.com", "aad")),
//!         "feed=Patient&startdate=2024-01-09&enddate=2024-01-10",
//!         b"",
//!     )
//!     .await;
//!
//! assert_eq!(response.status, 200);
//! assert!(response.body.starts_with(r#"{"feedName":"patient","sasUrls":["https://feeds.example.com/partners/TargetBase/patient/2024/01/9/patient.csv?"#));
//! assert!(response.body.ends_with(r#""Blob not found for the date: 2024-01-10"]}"#));
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authorization;
mod clock;
mod config;
mod context;
mod entitlement;
mod error;
mod issuer;
mod logging;
mod lookup;
mod orchestrator;
mod request;
mod sanitizer;
mod sas;
mod secret;
mod state;
pub mod storage;
mod tainted;
#[cfg(test)]
mod test_utils;
mod validator;
mod verified;
pub mod web;

pub use authorization::{AuthorizationResolver, PartnerId, DEFAULT_AUTH_METHOD};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FeedAccessConfig, StorageConfig};
pub use context::Ctx;
pub use entitlement::FeedEntitlementCatalog;
pub use error::{Error, Result, Violation, ViolationKind, GENERIC_INTERNAL_MESSAGE};
pub use issuer::{
    blob_path, not_found_sentinel, parse_not_found_sentinel, SignedUrlIssuer,
    DEFAULT_PROBE_CONCURRENCY,
};
pub use logging::{init_tracing, RequestLog};
pub use lookup::{FileLookup, Lookup, StaticLookup};
pub use orchestrator::{FeedAccessOrchestrator, FeedUrlsResponse};
pub use request::{Principal, RequestMeta};
pub use sanitizer::{
    DateSanitizer, FeedNameSanitizer, SanitizationError, SanitizationErrorKind, Sanitizer,
};
pub use sas::{
    SasPermission, SasPolicy, SharedKeySigner, DEFAULT_CLOCK_SKEW_MINUTES, MAX_CLOCK_SKEW_MINUTES,
    MAX_SAS_ACTIVE_TIME_IN_HRS, SAS_VERSION,
};
pub use secret::Secret;
pub use state::{Authed, Authorized, Unauthed};
pub use storage::{AzureBlobStore, BlobStore, MemoryBlobStore, StorageError};
pub use tainted::Tainted;
pub use validator::{FeedRequest, RequestParameterValidator, DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS};
pub use verified::Verified;
