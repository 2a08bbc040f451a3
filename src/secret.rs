use std::fmt;

use serde::{Deserialize, Deserializer};

/// A value that must never show up in logs or error output.
///
/// Used for the storage account key. `Debug` and `Display` always print
/// `[REDACTED]`; the value is only reachable through
/// [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use feed_access::Secret;
///
/// let key = Secret::new("c2VjcmV0LWtleQ==".to_string());
/// assert_eq!(format!("{:?}", key), "[REDACTED]");
/// assert_eq!(key.expose_secret(), "c2VjcmV0LWtleQ==");
/// ```
// No Copy or Default: secrets should not be duplicated or conjured casually.
#[derive(Clone)]
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Do not log or format the returned value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug_and_display() {
        let key = Secret::new("NJ4VDlkZswD8YaYq".to_string());

        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(format!("{}", key), "[REDACTED]");
        assert!(!format!("{:?}", key).contains("String"));
    }

    #[test]
    fn secret_exposes_when_explicit() {
        let key = Secret::new(vec![1u8, 2, 3]);
        assert_eq!(key.expose_secret(), &vec![1, 2, 3]);
    }

    #[test]
    fn secret_deserializes_transparently() {
        #[derive(Deserialize)]
        struct Holder {
            key: Secret<String>,
        }

        let holder: Holder = serde_json::from_str(r#"{"key": "abc"}"#).unwrap();
        assert_eq!(holder.key.expose_secret(), "abc");
        assert_eq!(format!("{:?}", holder.key), "[REDACTED]");
    }
}
