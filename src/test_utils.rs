//! Shared proptest strategies for unit tests.

use chrono::NaiveDate;
use proptest::prelude::*;

/// Feed names that the feed sanitizer accepts unchanged apart from case.
pub(crate) fn arb_feed_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_-]{0,31}").unwrap()
}

/// Calendar dates between 2000 and 2099.
pub(crate) fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..36_500).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}
