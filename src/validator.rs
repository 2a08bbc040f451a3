//! Request parameter validation.
//!
//! Turns the tainted `feed`, `startdate` and `enddate` parameters into a
//! [`FeedRequest`]. Checks run in a fixed order and the first failure wins,
//! so callers always see the same reason for the same input.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::authorization::PartnerId;
use crate::clock::Clock;
use crate::entitlement::FeedEntitlementCatalog;
use crate::error::Violation;
use crate::sanitizer::{DateSanitizer, FeedNameSanitizer, SanitizationErrorKind, Sanitizer};
use crate::verified::Verified;
use crate::web::TaintedInputs;

/// Default number of days of history a partner may pull.
pub const DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS: u32 = 30;

pub(crate) const MISSING_PARAMETERS_MESSAGE: &str = "missing or invalid feed/startdate/enddate";
pub(crate) const INVERTED_RANGE_MESSAGE: &str = "enddate earlier than startdate";
pub(crate) const FUTURE_DATE_MESSAGE: &str = "dates must not be in the future";

/// A validated feed request.
///
/// Only [`RequestParameterValidator`] builds one, so holding a `FeedRequest`
/// means every rule below already passed:
/// - `start_date <= end_date`
/// - neither date lies after the service's today
/// - `start_date` is within the allowed history window
/// - `feed_name` is lower-cased and entitled for `partner`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    partner: PartnerId,
    feed_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl FeedRequest {
    pub(crate) fn new(
        partner: PartnerId,
        feed_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            partner,
            feed_name,
            start_date,
            end_date,
        }
    }

    /// Partner the request is made for.
    pub fn partner(&self) -> &PartnerId {
        &self.partner
    }

    /// Lower-cased feed name.
    pub fn feed_name(&self) -> &str {
        &self.feed_name
    }

    /// First requested day.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last requested day (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Every day in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }

    /// Number of days in the range.
    pub fn day_count(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }
}

impl fmt::Display for FeedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}..={}",
            self.partner, self.feed_name, self.start_date, self.end_date
        )
    }
}

/// Validates raw request parameters against the calendar and the partner's
/// entitlements.
#[derive(Clone)]
pub struct RequestParameterValidator {
    catalog: FeedEntitlementCatalog,
    clock: Arc<dyn Clock>,
    feed_sanitizer: FeedNameSanitizer,
}

impl RequestParameterValidator {
    /// Creates a validator that checks feeds against `catalog`.
    pub fn new(catalog: FeedEntitlementCatalog, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            clock,
            feed_sanitizer: FeedNameSanitizer::default(),
        }
    }

    /// Validates `inputs` for `partner`.
    ///
    /// Each parameter is read from the query string first (key matched
    /// case-insensitively) and from the JSON body second.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ViolationKind::InvalidArgument)
    /// violation for the first failing check:
    /// 1. a parameter is missing or empty, or a date does not parse
    /// 2. `enddate` is before `startdate`
    /// 3. either date is after today
    /// 4. `startdate` is more than `allowed_days` days ago
    /// 5. the partner has no entitlement entry
    /// 6. the feed is not among the partner's entitlements
    ///
    /// The feed name is lower-cased but not trimmed. Names with control
    /// characters or over the length limit fail at step 6.
    pub fn validate(
        &self,
        inputs: &TaintedInputs,
        partner: &PartnerId,
        allowed_days: u32,
    ) -> Result<FeedRequest, Violation> {
        let missing = || Violation::invalid_argument(MISSING_PARAMETERS_MESSAGE);

        let feed = match inputs.get("feed").map(|raw| self.feed_sanitizer.sanitize(raw)) {
            None => return Err(missing()),
            Some(Err(err)) if err.kind() == SanitizationErrorKind::Empty => {
                return Err(missing());
            }
            Some(feed) => feed,
        };
        let start_date = inputs
            .get("startdate")
            .and_then(|raw| DateSanitizer.sanitize(raw).ok())
            .ok_or_else(missing)?
            .into_inner();
        let end_date = inputs
            .get("enddate")
            .and_then(|raw| DateSanitizer.sanitize(raw).ok())
            .ok_or_else(missing)?
            .into_inner();

        if start_date > end_date {
            return Err(Violation::invalid_argument(INVERTED_RANGE_MESSAGE));
        }

        let today = self.clock.today();
        if start_date > today || end_date > today {
            return Err(Violation::invalid_argument(FUTURE_DATE_MESSAGE));
        }

        if (today - start_date).num_days() > i64::from(allowed_days) {
            return Err(Violation::invalid_argument(format!(
                "range exceeds allowed history window of {allowed_days} days"
            )));
        }

        let feeds = self.catalog.entitled_feeds(partner.as_str()).ok_or_else(|| {
            Violation::invalid_argument(format!("feeds not exposed for partner '{partner}'"))
        })?;

        let feed_name = feed.map(Verified::into_inner).map_err(|_| {
            Violation::invalid_argument(format!("feed not exposed for partner '{partner}'"))
        })?;

        if !feeds.contains(&feed_name) {
            return Err(Violation::invalid_argument(format!(
                "feed '{feed_name}' not exposed for partner '{partner}'"
            )));
        }

        Ok(FeedRequest::new(
            partner.clone(),
            feed_name,
            start_date,
            end_date,
        ))
    }
}

impl fmt::Debug for RequestParameterValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParameterValidator")
            .field("catalog", &self.catalog)
            .field("feed_sanitizer", &self.feed_sanitizer)
            .finish_non_exhaustive()
    }
}
