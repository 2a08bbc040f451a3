use std::fmt;

/// A request parameter that has not been validated yet.
///
/// `Tainted<T>` marks every value read from the query string or body. The
/// inner value cannot be read from outside the crate; the only way out is a
/// [`Sanitizer`](crate::Sanitizer), which yields a [`Verified<T>`](crate::Verified).
///
/// # Examples
///
/// ```
/// use feed_access::Tainted;
///
/// let feed = Tainted::new("Client".to_string());
/// println!("{:?}", feed); // Tainted { inner: "Client" }
///
/// // Not usable as a String:
/// // let path = format!("TargetBase/{}", feed); // Won't compile!
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Tainted<T> {
    // Must stay private; sanitizers are the only readers.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Only sanitizer implementations call this, right before validating the
    /// value and wrapping it in `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

// No Deref, AsRef, Borrow or Into<T>: raw request input must go through a
// sanitizer before it can reach a blob path.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
