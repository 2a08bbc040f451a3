//! Integration property tests for feed-access.
//!
//! Cross-module invariants of the request pipeline, driven against the
//! in-memory blob store.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use futures::executor::block_on;
use proptest::prelude::*;

use feed_access::web::{ExtractTaintedInputs, RequestAdapter};
use feed_access::{
    blob_path, not_found_sentinel, parse_not_found_sentinel, FeedAccessOrchestrator, FixedClock,
    MemoryBlobStore, Principal, RequestMeta, StaticLookup, ViolationKind,
};

const TODAY: (i32, u32, u32) = (2024, 3, 15);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).unwrap()
}

fn orchestrator(store: Arc<MemoryBlobStore>, concurrency: usize) -> FeedAccessOrchestrator {
    FeedAccessOrchestrator::new(
        Arc::new(StaticLookup::new().with("kevin@example.com", "TargetBase")),
        Arc::new(StaticLookup::new().with("TargetBase", "client,patient")),
        store,
    )
    .with_clock(Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(TODAY.0, TODAY.1, TODAY.2, 12, 0, 0).unwrap(),
    )))
    .with_probe_concurrency(concurrency)
}

fn meta() -> RequestMeta {
    RequestMeta {
        request_id: "req-prop".to_string(),
        principal: Some(Principal::authenticated("kevin@example.com", "aad")),
    }
}

fn query(feed: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "feed={feed}&startdate={}&enddate={}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

// Strategy: a valid range inside the 30 day window, plus which days exist
fn arb_range_and_present() -> impl Strategy<Value = (NaiveDate, NaiveDate, BTreeSet<i64>)> {
    (0i64..=30)
        .prop_flat_map(|start_back| (Just(start_back), 0i64..=start_back))
        .prop_flat_map(|(start_back, end_back)| {
            let len = (start_back - end_back + 1) as usize;
            (
                Just(start_back),
                Just(end_back),
                prop::collection::vec(any::<bool>(), len),
            )
        })
        .prop_map(|(start_back, end_back, flags)| {
            let present = flags
                .iter()
                .enumerate()
                .filter(|(_, exists)| **exists)
                .map(|(i, _)| i as i64)
                .collect();
            (
                today() - Duration::days(start_back),
                today() - Duration::days(end_back),
                present,
            )
        })
}

fn arb_feed_casing() -> impl Strategy<Value = String> {
    prop_oneof![Just("client"), Just("Client"), Just("CLIENT"), Just("pAtIeNt")]
        .prop_map(str::to_string)
}

fn store_with(feed: &str, start: NaiveDate, present: &BTreeSet<i64>) -> MemoryBlobStore {
    let mut store = MemoryBlobStore::new("https://feeds.example.com", "partners");
    for offset in present {
        store = store.with_object(blob_path("TargetBase", feed, start + Duration::days(*offset)));
    }
    store
}

proptest! {
    /// One entry per day, ascending, each entry pointing at its own day
    #[test]
    fn proptest_entries_cover_range_in_order(
        (start, end, present) in arb_range_and_present(),
        feed in arb_feed_casing(),
        concurrency in 1usize..8,
    ) {
        let canonical = feed.to_lowercase();
        let store = Arc::new(store_with(&canonical, start, &present));
        let inputs = RequestAdapter::from_query_string("req", &query(&feed, start, end))
            .extract_tainted_inputs();

        let response = block_on(orchestrator(store.clone(), concurrency).handle(meta(), &inputs))
            .expect("valid request");

        let expected_len = (end - start).num_days() as usize + 1;
        prop_assert_eq!(&response.feed_name, &canonical);
        prop_assert_eq!(response.sas_urls.len(), expected_len);
        prop_assert_eq!(store.probe_count(), expected_len);

        for (i, entry) in response.sas_urls.iter().enumerate() {
            let day = start + Duration::days(i as i64);
            if present.contains(&(i as i64)) {
                let path = format!(
                    "/partners/TargetBase/{}/{}/{:02}/{}/{}.csv?",
                    canonical, day.year(), day.month(), day.day(), canonical
                );
                prop_assert!(entry.contains(&path), "{} missing {}", entry, path);
            } else {
                prop_assert_eq!(entry, &not_found_sentinel(day));
            }
        }
    }

    /// Same inputs and storage state give the same answer
    #[test]
    fn proptest_issuance_is_idempotent(
        (start, end, present) in arb_range_and_present(),
    ) {
        let store = Arc::new(store_with("client", start, &present));
        let orchestrator = orchestrator(store, 4);
        let inputs = RequestAdapter::from_query_string("req", &query("client", start, end))
            .extract_tainted_inputs();

        let first = block_on(orchestrator.handle(meta(), &inputs)).expect("valid request");
        let second = block_on(orchestrator.handle(meta(), &inputs)).expect("valid request");

        prop_assert_eq!(&first.feed_name, &second.feed_name);
        let missing = |urls: &[String]| -> Vec<NaiveDate> {
            urls.iter().filter_map(|u| parse_not_found_sentinel(u)).collect()
        };
        prop_assert_eq!(missing(first.sas_urls.as_slice()), missing(second.sas_urls.as_slice()));
        prop_assert_eq!(first, second);
    }

    /// Any date after today is rejected before storage is touched
    #[test]
    fn proptest_future_dates_rejected(
        ahead in 1i64..400,
        span in 0i64..10,
    ) {
        let store = Arc::new(MemoryBlobStore::new("https://feeds.example.com", "partners"));
        let start = today() - Duration::days(span);
        let end = today() + Duration::days(ahead);
        let inputs = RequestAdapter::from_query_string("req", &query("client", start, end))
            .extract_tainted_inputs();

        let err = block_on(orchestrator(store.clone(), 4).handle(meta(), &inputs))
            .expect_err("future end date");

        prop_assert_eq!(err.violation().map(|v| v.kind), Some(ViolationKind::InvalidArgument));
        prop_assert_eq!(err.client_message(), "dates must not be in the future");
        prop_assert_eq!(store.probe_count(), 0);
    }

    /// Inverted ranges are rejected before storage is touched
    #[test]
    fn proptest_inverted_range_rejected(
        end_back in 1i64..=30,
        gap in 1i64..=30,
    ) {
        prop_assume!(end_back >= gap);
        let store = Arc::new(MemoryBlobStore::new("https://feeds.example.com", "partners"));
        let end = today() - Duration::days(end_back);
        let start = end + Duration::days(gap);
        let inputs = RequestAdapter::from_query_string("req", &query("client", start, end))
            .extract_tainted_inputs();

        let err = block_on(orchestrator(store.clone(), 4).handle(meta(), &inputs))
            .expect_err("inverted range");

        prop_assert_eq!(err.client_message(), "enddate earlier than startdate");
        prop_assert_eq!(store.probe_count(), 0);
    }

    /// Blob paths split back into partner, feed and date parts
    #[test]
    fn proptest_blob_path_layout(offset in 0i64..36_500) {
        let day = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset);
        let path = blob_path("TargetBase", "client", day);
        let parts: Vec<&str> = path.split('/').collect();

        prop_assert_eq!(parts.len(), 6);
        prop_assert_eq!(parts[0], "TargetBase");
        prop_assert_eq!(parts[1], "client");
        prop_assert_eq!(parts[2].parse::<i32>().unwrap(), day.year());
        prop_assert_eq!(parts[3].len(), 2);
        prop_assert_eq!(parts[3].parse::<u32>().unwrap(), day.month());
        prop_assert_eq!(parts[4], day.day().to_string());
        prop_assert_eq!(parts[5], "client.csv");
    }
}
