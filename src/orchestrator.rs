//! End-to-end request handling.
//!
//! Composes partner resolution, parameter validation and URL issuance into
//! the single contract exposed to the web layer.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use crate::authorization::AuthorizationResolver;
use crate::clock::{Clock, SystemClock};
use crate::config::FeedAccessConfig;
use crate::context::Ctx;
use crate::entitlement::FeedEntitlementCatalog;
use crate::error::{Error, Result};
use crate::issuer::{parse_not_found_sentinel, SignedUrlIssuer, DEFAULT_PROBE_CONCURRENCY};
use crate::logging::RequestLog;
use crate::lookup::Lookup;
use crate::request::RequestMeta;
use crate::sas::DEFAULT_CLOCK_SKEW_MINUTES;
use crate::storage::{AzureBlobStore, BlobStore};
use crate::validator::{RequestParameterValidator, DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS};
use crate::web::TaintedInputs;

/// Successful response payload.
///
/// Serializes as `{"feedName": "...", "sasUrls": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedUrlsResponse {
    /// Lower-cased feed name
    pub feed_name: String,
    /// One entry per requested day, ascending
    pub sas_urls: Vec<String>,
}

impl FeedUrlsResponse {
    /// Number of entries that are not-found sentinels.
    pub fn missing_days(&self) -> usize {
        self.sas_urls
            .iter()
            .filter(|entry| parse_not_found_sentinel(entry).is_some())
            .count()
    }
}

/// Handles one feed URL request from principal to response.
///
/// # Examples
///
/// ```
/// # futures::executor::block_on(async {
/// use std::sync::Arc;
/// use chrono::{TimeZone, Utc};
/// use feed_access::web::{ExtractTaintedInputs, RequestAdapter};
/// use feed_access::{
///     FeedAccessOrchestrator, FixedClock, MemoryBlobStore, Principal, RequestMeta, StaticLookup,
/// };
///
/// let store = MemoryBlobStore::new("https://feeds.example.com", "partners")
///     .with_object("TargetBase/client/2024/01/5/client.csv");
/// let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap());
///
/// let orchestrator = FeedAccessOrchestrator::new(
///     Arc::new(StaticLookup::new().with("kevin@example.com", "TargetBase")),
///     Arc::new(StaticLookup::new().with("TargetBase", "client,patient")),
///     Arc::new(store),
/// )
/// .with_clock(Arc::new(clock));
///
/// let inputs = RequestAdapter::from_query_string(
///     "req-1",
///     "feed=Client&startdate=2024-01-05&enddate=2024-01-06",
/// )
/// .extract_tainted_inputs();
/// let meta = RequestMeta {
///     request_id: "req-1".to_string(),
///     principal: Some(Principal::authenticated("kevin@example.com", "aad")),
/// };
///
/// let response = orchestrator.handle(meta, &inputs).await.unwrap();
/// assert_eq!(response.feed_name, "client");
/// assert_eq!(response.sas_urls.len(), 2);
/// assert_eq!(response.sas_urls[1], "Blob not found for the date: 2024-01-06");
/// # });
/// ```
#[derive(Clone)]
pub struct FeedAccessOrchestrator {
    resolver: AuthorizationResolver,
    catalog: FeedEntitlementCatalog,
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    allowed_data_access_in_days: u32,
    sas_active_time_in_hrs: u32,
    clock_skew: Duration,
    probe_concurrency: usize,
    validator: RequestParameterValidator,
    issuer: SignedUrlIssuer,
}

impl FeedAccessOrchestrator {
    /// Creates an orchestrator with default windows and the system clock.
    pub fn new(
        partners: Arc<dyn Lookup>,
        entitlements: Arc<dyn Lookup>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        let catalog = FeedEntitlementCatalog::new(entitlements);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            resolver: AuthorizationResolver::new(partners),
            validator: RequestParameterValidator::new(catalog.clone(), clock.clone()),
            issuer: SignedUrlIssuer::new(store.clone(), clock.clone()),
            catalog,
            store,
            clock,
            allowed_data_access_in_days: DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS,
            sas_active_time_in_hrs: 8,
            clock_skew: Duration::minutes(DEFAULT_CLOCK_SKEW_MINUTES),
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }

    /// Builds an orchestrator backed by Azure Blob Storage from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a lookup file cannot be loaded or the
    /// storage client cannot be created.
    pub fn from_config(config: &FeedAccessConfig) -> Result<Self> {
        let store = AzureBlobStore::new(&config.storage)
            .map_err(|e| Error::Config(format!("storage: {e}")))?;
        Self::from_config_with_store(config, Arc::new(store))
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied store.
    ///
    /// `config` is validated again, so hand-built values out of range are
    /// rejected with [`Error::Config`].
    pub fn from_config_with_store(
        config: &FeedAccessConfig,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        config.validate()?;
        let partners = config.partner_lookup()?;
        let mut orchestrator = Self::new(partners.clone(), config.entitlement_lookup()?, store);
        orchestrator.resolver =
            AuthorizationResolver::with_method(partners, config.accepted_auth_method.clone());
        orchestrator.allowed_data_access_in_days = config.allowed_data_access_in_days;
        orchestrator.sas_active_time_in_hrs = config.sas_active_time_in_hrs;
        orchestrator.clock_skew = Duration::minutes(config.clock_skew_minutes);
        orchestrator.probe_concurrency = config.probe_concurrency;
        Ok(orchestrator.rebuild())
    }

    /// Replaces the clock used for date checks and signature windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild()
    }

    /// Sets how many days back a request may start.
    pub fn with_allowed_data_access_in_days(mut self, days: u32) -> Self {
        self.allowed_data_access_in_days = days;
        self
    }

    /// Sets the lifetime of issued URLs.
    pub fn with_sas_active_time_in_hrs(mut self, hours: u32) -> Self {
        self.sas_active_time_in_hrs = hours;
        self
    }

    /// Sets the number of existence probes in flight per request.
    pub fn with_probe_concurrency(mut self, concurrency: usize) -> Self {
        self.probe_concurrency = concurrency;
        self.rebuild()
    }

    fn rebuild(mut self) -> Self {
        self.validator = RequestParameterValidator::new(self.catalog.clone(), self.clock.clone());
        self.issuer = SignedUrlIssuer::new(self.store.clone(), self.clock.clone())
            .with_clock_skew(self.clock_skew)
            .with_concurrency(self.probe_concurrency);
        self
    }

    /// Handles one request.
    ///
    /// Client errors are logged at `warn`, internal failures at `error` with
    /// the full error chain.
    ///
    /// # Errors
    ///
    /// - [`Error::Violation`] for authorization and validation failures; the
    ///   message may be returned to the caller
    /// - [`Error::StorageUnavailable`] if an existence probe or a signature
    ///   fails; callers should answer with
    ///   [`GENERIC_INTERNAL_MESSAGE`](crate::GENERIC_INTERNAL_MESSAGE)
    pub async fn handle(
        &self,
        meta: RequestMeta,
        inputs: &TaintedInputs,
    ) -> Result<FeedUrlsResponse> {
        let request_id = meta.request_id.clone();
        let (ctx, principal) = Ctx::from_meta(meta);

        let ctx = match ctx
            .authenticate(principal)
            .and_then(|ctx| ctx.authorize(&self.resolver))
        {
            Ok(ctx) => ctx,
            Err(violation) => {
                let err = Error::from(violation);
                Self::report(RequestLog::new(&request_id, None), &err);
                return Err(err);
            }
        };

        match self.issue(&ctx, inputs).await {
            Ok(response) => {
                ctx.log().info(format_args!(
                    "issued {} entries for feed '{}' ({} missing)",
                    response.sas_urls.len(),
                    response.feed_name,
                    response.missing_days()
                ));
                Ok(response)
            }
            Err(err) => {
                Self::report(ctx.log(), &err);
                Err(err)
            }
        }
    }

    async fn issue(&self, ctx: &Ctx, inputs: &TaintedInputs) -> Result<FeedUrlsResponse> {
        let request = self
            .validator
            .validate(inputs, ctx.partner(), self.allowed_data_access_in_days)?;
        ctx.log().debug(format_args!("validated {request}"));

        let sas_urls = self.issuer.issue(&request, self.sas_active_time_in_hrs).await?;

        Ok(FeedUrlsResponse {
            feed_name: request.feed_name().to_string(),
            sas_urls,
        })
    }

    fn report(log: RequestLog<'_>, err: &Error) {
        if err.is_client_error() {
            log.warn(format_args!("request rejected: {err}"));
        } else {
            log.error(format_args!("request failed: {}", error_chain(err)));
        }
    }
}

impl std::fmt::Debug for FeedAccessOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedAccessOrchestrator")
            .field("resolver", &self.resolver)
            .field("issuer", &self.issuer)
            .field("allowed_data_access_in_days", &self.allowed_data_access_in_days)
            .field("sas_active_time_in_hrs", &self.sas_active_time_in_hrs)
            .finish_non_exhaustive()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
