use std::fmt;
use std::sync::Arc;

use crate::error::{Violation, ViolationKind};
use crate::lookup::Lookup;
use crate::request::Principal;

/// Authentication method accepted unless configured otherwise.
pub const DEFAULT_AUTH_METHOD: &str = "aad";

pub(crate) const UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized request. Contact the data team for access.";
pub(crate) const UNSUPPORTED_METHOD_MESSAGE: &str =
    "Unsupported authentication method. Contact the data team for access details.";

/// Identifies a data partner, e.g. `TargetBase`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartnerId(String);

impl PartnerId {
    /// Wraps a partner key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The partner key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps an authenticated principal to the partner it acts for.
///
/// Fails closed: anything other than an authenticated principal using the
/// accepted method and present in the partner table is rejected.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use feed_access::{AuthorizationResolver, Principal, StaticLookup};
///
/// let partners = StaticLookup::new().with("kevin@example.com", "TargetBase");
/// let resolver = AuthorizationResolver::new(Arc::new(partners));
///
/// let partner = resolver
///     .resolve_partner(&Principal::authenticated("kevin@example.com", "AAD"))
///     .unwrap();
/// assert_eq!(partner.as_str(), "TargetBase");
/// ```
#[derive(Clone)]
pub struct AuthorizationResolver {
    partners: Arc<dyn Lookup>,
    accepted_method: String,
}

impl AuthorizationResolver {
    /// Creates a resolver accepting [`DEFAULT_AUTH_METHOD`].
    pub fn new(partners: Arc<dyn Lookup>) -> Self {
        Self::with_method(partners, DEFAULT_AUTH_METHOD)
    }

    /// Creates a resolver accepting `method` (compared case-insensitively).
    pub fn with_method(partners: Arc<dyn Lookup>, method: impl Into<String>) -> Self {
        Self {
            partners,
            accepted_method: method.into(),
        }
    }

    /// Resolves the partner the principal acts for.
    ///
    /// Only the first comma-separated entry of a multi-valued partner mapping
    /// is used.
    ///
    /// # Errors
    ///
    /// - [`ViolationKind::Unauthenticated`] if the principal is not authenticated
    /// - [`ViolationKind::UnsupportedAuthMethod`] for any other authentication method
    /// - [`ViolationKind::Unauthorized`] if the principal has no partner mapping
    pub fn resolve_partner(&self, principal: &Principal) -> Result<PartnerId, Violation> {
        if !principal.is_authenticated {
            return Err(Violation::new(
                ViolationKind::Unauthenticated,
                UNAUTHORIZED_MESSAGE,
            ));
        }

        if !principal
            .authentication_method
            .eq_ignore_ascii_case(&self.accepted_method)
        {
            return Err(Violation::new(
                ViolationKind::UnsupportedAuthMethod,
                UNSUPPORTED_METHOD_MESSAGE,
            ));
        }

        let partner = self
            .partners
            .lookup(&principal.name)
            .and_then(|value| value.split(',').next().map(|p| p.trim().to_string()))
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Violation::new(ViolationKind::Unauthorized, UNAUTHORIZED_MESSAGE))?;

        Ok(PartnerId(partner))
    }
}

impl fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationResolver")
            .field("accepted_method", &self.accepted_method)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticLookup;

    fn resolver() -> AuthorizationResolver {
        let partners = StaticLookup::new()
            .with("arnay@example.com", "TargetBase")
            .with("multi@example.com", "TargetBase,Acme")
            .with("blank@example.com", "")
            .with("leading@example.com", ",Acme");
        AuthorizationResolver::new(Arc::new(partners))
    }

    #[test]
    fn resolves_mapped_principal() {
        let partner = resolver()
            .resolve_partner(&Principal::authenticated("arnay@example.com", "aad"))
            .unwrap();

        assert_eq!(partner, PartnerId::new("TargetBase"));
    }

    #[test]
    fn method_comparison_ignores_case() {
        let partner = resolver()
            .resolve_partner(&Principal::authenticated("arnay@example.com", "AAD"))
            .unwrap();

        assert_eq!(partner.as_str(), "TargetBase");
    }

    #[test]
    fn unauthenticated_principal_is_rejected() {
        let err = resolver()
            .resolve_partner(&Principal::anonymous())
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::Unauthenticated);
        assert_eq!(err.message, UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn unsupported_method_is_rejected_before_lookup() {
        let err = resolver()
            .resolve_partner(&Principal::authenticated("arnay@example.com", "facebook"))
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::UnsupportedAuthMethod);
    }

    #[test]
    fn unmapped_principal_is_rejected() {
        let err = resolver()
            .resolve_partner(&Principal::authenticated("stranger@example.com", "aad"))
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::Unauthorized);
    }

    #[test]
    fn principal_key_is_case_sensitive() {
        let err = resolver()
            .resolve_partner(&Principal::authenticated("ARNAY@example.com", "aad"))
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::Unauthorized);
    }

    #[test]
    fn only_first_partner_is_honored() {
        let partner = resolver()
            .resolve_partner(&Principal::authenticated("multi@example.com", "aad"))
            .unwrap();

        assert_eq!(partner.as_str(), "TargetBase");
    }

    #[test]
    fn empty_mapping_is_rejected() {
        for name in ["blank@example.com", "leading@example.com"] {
            let err = resolver()
                .resolve_partner(&Principal::authenticated(name, "aad"))
                .unwrap_err();
            assert_eq!(err.kind, ViolationKind::Unauthorized, "{name}");
        }
    }

    #[test]
    fn custom_method_can_be_configured() {
        let partners = StaticLookup::new().with("svc", "TargetBase");
        let resolver = AuthorizationResolver::with_method(Arc::new(partners), "Bearer");

        assert!(resolver
            .resolve_partner(&Principal::authenticated("svc", "bearer"))
            .is_ok());
        assert_eq!(
            resolver
                .resolve_partner(&Principal::authenticated("svc", "aad"))
                .unwrap_err()
                .kind,
            ViolationKind::UnsupportedAuthMethod
        );
    }
}
