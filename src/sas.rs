//! Shared access signature policies and shared-key signing.
//!
//! Signed URLs follow the Azure service SAS format for blob resources. The
//! signature is an HMAC-SHA256 over a newline-joined string-to-sign, keyed
//! with the base64-decoded storage account key.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::secret::Secret;
use crate::storage::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Signed storage service version.
pub const SAS_VERSION: &str = "2019-12-12";

/// Minutes a signature is back-dated to tolerate clock skew between hosts.
pub const DEFAULT_CLOCK_SKEW_MINUTES: i64 = 5;

/// Longest accepted URL lifetime (one year).
pub const MAX_SAS_ACTIVE_TIME_IN_HRS: u32 = 8760;

/// Largest accepted back-dating of a signature.
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 60;

const SAS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Permission granted by a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SasPermission {
    /// Read the blob content and properties
    Read,
}

impl SasPermission {
    /// Permission letter used in the `sp` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SasPermission::Read => "r",
        }
    }
}

/// Validity window and permission for one signed URL.
///
/// Built fresh for every issued URL and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SasPolicy {
    /// Start of validity, back-dated by the clock skew margin
    pub valid_from: DateTime<Utc>,
    /// End of validity
    pub valid_until: DateTime<Utc>,
    /// Granted permission
    pub permission: SasPermission,
}

impl SasPolicy {
    /// Read-only policy valid from `now - clock_skew` until `now + active`.
    ///
    /// Both ends saturate at the representable date range instead of
    /// overflowing.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use feed_access::{SasPermission, SasPolicy};
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
    /// let policy = SasPolicy::read_only(now, Duration::hours(8), Duration::minutes(5));
    ///
    /// assert_eq!(policy.valid_from, now - Duration::minutes(5));
    /// assert_eq!(policy.valid_until, now + Duration::hours(8));
    /// assert_eq!(policy.permission, SasPermission::Read);
    /// ```
    pub fn read_only(now: DateTime<Utc>, active: Duration, clock_skew: Duration) -> Self {
        Self {
            valid_from: now
                .checked_sub_signed(clock_skew)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            valid_until: now
                .checked_add_signed(active)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            permission: SasPermission::Read,
        }
    }

    /// Returns `true` if `at` falls inside the validity window.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at <= self.valid_until
    }
}

/// Signs blob URLs with a storage account shared key.
#[derive(Clone)]
pub struct SharedKeySigner {
    account_name: String,
    key: Secret<Vec<u8>>,
}

impl SharedKeySigner {
    /// Creates a signer from the account name and its base64-encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidCredential`] if the key is not valid base64.
    pub fn new(
        account_name: impl Into<String>,
        account_key: &Secret<String>,
    ) -> Result<Self, StorageError> {
        let key = STANDARD
            .decode(account_key.expose_secret().trim())
            .map_err(|e| StorageError::InvalidCredential(format!("account key is not base64: {e}")))?;

        Ok(Self {
            account_name: account_name.into(),
            key: Secret::new(key),
        })
    }

    /// Storage account the signer belongs to.
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Builds the signed query string for `blob_path` in `container`.
    ///
    /// The result starts with `?` and can be appended to the blob URL as-is.
    pub fn sign(
        &self,
        container: &str,
        blob_path: &str,
        policy: &SasPolicy,
    ) -> Result<String, StorageError> {
        let start = policy.valid_from.format(SAS_TIME_FORMAT).to_string();
        let expiry = policy.valid_until.format(SAS_TIME_FORMAT).to_string();
        let permission = policy.permission.as_str();

        let string_to_sign = self.string_to_sign(container, blob_path, permission, &start, &expiry);

        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sv", SAS_VERSION)
            .append_pair("st", &start)
            .append_pair("se", &expiry)
            .append_pair("sr", "b")
            .append_pair("sp", permission)
            .append_pair("sig", &signature)
            .finish();

        Ok(format!("?{query}"))
    }

    /// Service SAS string-to-sign for a blob resource.
    ///
    /// Unused optional fields (identifier, IP range, protocol, snapshot time
    /// and response header overrides) are present as empty lines.
    fn string_to_sign(
        &self,
        container: &str,
        blob_path: &str,
        permission: &str,
        start: &str,
        expiry: &str,
    ) -> String {
        let canonical_resource = format!("/blob/{}/{}/{}", self.account_name, container, blob_path);

        [
            permission,
            start,
            expiry,
            canonical_resource.as_str(),
            "", // signed identifier
            "", // signed IP
            "", // signed protocol
            SAS_VERSION,
            "b",
            "", // snapshot time
            "", // rscc
            "", // rscd
            "", // rsce
            "", // rscl
            "", // rsct
        ]
        .join("\n")
    }
}

impl fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeySigner")
            .field("account_name", &self.account_name)
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn signer() -> SharedKeySigner {
        // base64("feed-access-test-key")
        let key = Secret::new("ZmVlZC1hY2Nlc3MtdGVzdC1rZXk=".to_string());
        SharedKeySigner::new("feedstore", &key).unwrap()
    }

    fn policy() -> SasPolicy {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        SasPolicy::read_only(now, Duration::hours(8), Duration::minutes(5))
    }

    fn query_pairs(query: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn policy_window_is_back_dated() {
        let policy = policy();
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();

        assert!(policy.is_active_at(now));
        assert!(policy.is_active_at(now - Duration::minutes(5)));
        assert!(!policy.is_active_at(now - Duration::minutes(6)));
        assert!(policy.is_active_at(now + Duration::hours(8)));
        assert!(!policy.is_active_at(now + Duration::hours(8) + Duration::seconds(1)));
    }

    #[test]
    fn policy_window_saturates_instead_of_overflowing() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let huge = Duration::days(100_000_000);
        let policy = SasPolicy::read_only(now, huge, huge);

        assert_eq!(policy.valid_until, DateTime::<Utc>::MAX_UTC);
        assert_eq!(policy.valid_from, DateTime::<Utc>::MIN_UTC);
        assert!(policy.is_active_at(now));
    }

    #[test]
    fn signed_query_has_expected_fields() {
        let query = signer()
            .sign("partners", "TargetBase/client/2024/01/5/client.csv", &policy())
            .unwrap();

        assert!(query.starts_with('?'));
        let pairs = query_pairs(&query);
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["sv", "st", "se", "sr", "sp", "sig"]);
        assert_eq!(pairs[0].1, SAS_VERSION);
        assert_eq!(pairs[1].1, "2024-01-05T11:55:00Z");
        assert_eq!(pairs[2].1, "2024-01-05T20:00:00Z");
        assert_eq!(pairs[3].1, "b");
        assert_eq!(pairs[4].1, "r");

        let sig = STANDARD.decode(&pairs[5].1).unwrap();
        assert_eq!(sig.len(), 32);
    }

    #[test]
    fn signature_is_deterministic_and_path_scoped() {
        let signer = signer();
        let a = signer.sign("partners", "TargetBase/client/2024/01/5/client.csv", &policy()).unwrap();
        let b = signer.sign("partners", "TargetBase/client/2024/01/5/client.csv", &policy()).unwrap();
        let c = signer.sign("partners", "TargetBase/client/2024/01/6/client.csv", &policy()).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn string_to_sign_layout() {
        let s = signer().string_to_sign("partners", "a/b.csv", "r", "S", "E");
        let lines: Vec<_> = s.split('\n').collect();

        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "r");
        assert_eq!(lines[1], "S");
        assert_eq!(lines[2], "E");
        assert_eq!(lines[3], "/blob/feedstore/partners/a/b.csv");
        assert_eq!(lines[7], SAS_VERSION);
        assert_eq!(lines[8], "b");
    }

    #[test]
    fn invalid_key_is_rejected() {
        let err = SharedKeySigner::new("feedstore", &Secret::new("not base64!".to_string()))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidCredential(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains("feedstore"));
        assert!(debug.contains("[REDACTED]"));
    }
}
