use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::lookup::Lookup;

/// Maps a partner to the feed names it may pull.
///
/// Partner keys are matched case-sensitively; feed names are returned
/// lower-cased.
#[derive(Clone)]
pub struct FeedEntitlementCatalog {
    feeds: Arc<dyn Lookup>,
}

impl FeedEntitlementCatalog {
    /// Creates a catalog backed by `feeds`.
    pub fn new(feeds: Arc<dyn Lookup>) -> Self {
        Self { feeds }
    }

    /// Returns the feeds `partner` is entitled to.
    ///
    /// `None` means the partner has no entry at all, which callers report
    /// differently from an entry that lists no feeds.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use feed_access::{FeedEntitlementCatalog, StaticLookup};
    ///
    /// let catalog = FeedEntitlementCatalog::new(Arc::new(
    ///     StaticLookup::new().with("TargetBase", "Client").with("TargetBase", "Patient"),
    /// ));
    ///
    /// let feeds = catalog.entitled_feeds("TargetBase").unwrap();
    /// assert!(feeds.contains("client"));
    /// assert!(feeds.contains("patient"));
    /// assert!(catalog.entitled_feeds("Acme").is_none());
    /// ```
    pub fn entitled_feeds(&self, partner: &str) -> Option<BTreeSet<String>> {
        self.feeds.lookup(partner).map(|value| {
            value
                .to_lowercase()
                .split(',')
                .map(str::trim)
                .filter(|feed| !feed.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

impl fmt::Debug for FeedEntitlementCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedEntitlementCatalog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticLookup;

    fn catalog() -> FeedEntitlementCatalog {
        FeedEntitlementCatalog::new(Arc::new(
            StaticLookup::new()
                .with("TargetBase", "Client")
                .with("TargetBase", "Patient")
                .with("Empty", ""),
        ))
    }

    #[test]
    fn feeds_are_lower_cased() {
        let feeds = catalog().entitled_feeds("TargetBase").unwrap();
        let feeds: Vec<_> = feeds.iter().map(String::as_str).collect();

        assert_eq!(feeds, vec!["client", "patient"]);
    }

    #[test]
    fn unknown_partner_is_none() {
        assert!(catalog().entitled_feeds("Acme").is_none());
    }

    #[test]
    fn partner_key_is_case_sensitive() {
        assert!(catalog().entitled_feeds("targetbase").is_none());
    }

    #[test]
    fn empty_entry_is_empty_set() {
        let feeds = catalog().entitled_feeds("Empty");
        assert_eq!(feeds, Some(BTreeSet::new()));
    }
}
