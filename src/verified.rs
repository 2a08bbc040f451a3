/// A request parameter that has passed a [`Sanitizer`](crate::Sanitizer).
///
/// There is no public constructor: external code can only obtain a
/// `Verified<T>` by sanitizing a [`Tainted<T>`](crate::Tainted).
///
/// ```compile_fail
/// use feed_access::Verified;
///
/// let verified = Verified::new_unchecked("client".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without validating it.
    ///
    /// Callers must already have validated `value`; only sanitizers in this
    /// crate do so.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_as_ref_does_not_consume() {
        let verified = Verified::new_unchecked("client".to_string());

        assert_eq!(verified.as_ref(), "client");
        assert_eq!(verified.as_ref().len(), 6);
        assert_eq!(verified.into_inner(), "client");
    }

    mod proptests {
        use super::*;
        use crate::{sanitizer::DateSanitizer, test_utils::arb_date, Sanitizer, Tainted};
        use proptest::prelude::*;

        proptest! {
            /// ISO dates survive the Tainted -> DateSanitizer -> Verified flow unchanged
            #[test]
            fn proptest_iso_dates_round_trip(date in arb_date()) {
                let tainted = Tainted::new(date.format("%Y-%m-%d").to_string());

                let verified = DateSanitizer.sanitize(tainted).expect("ISO date should parse");

                prop_assert_eq!(*verified.as_ref(), date);
            }
        }
    }
}
