use crate::authorization::{AuthorizationResolver, PartnerId, UNAUTHORIZED_MESSAGE};
use crate::error::{Violation, ViolationKind};
use crate::logging::RequestLog;
use crate::request::{Principal, RequestMeta};
use crate::state::{Authed, Authorized, Unauthed};

/// Per-request context.
///
/// `Ctx<S>` is generic over how far the request has been checked:
/// - `Ctx<Unauthed>`: request id only
/// - `Ctx<Authed>`: plus an authenticated principal
/// - `Ctx<Authorized>`: plus the partner the principal acts for
///
/// ```text
/// Ctx<Unauthed> --authenticate--> Ctx<Authed> --authorize--> Ctx<Authorized>
/// ```
///
/// Contexts cannot be built outside the crate; the orchestrator and the web
/// extractors create them from a [`RequestMeta`].
#[derive(Debug, Clone)]
pub struct Ctx<S = Authorized> {
    request_id: String,
    principal: Option<Principal>,
    state: S,
}

impl<S> Ctx<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal, `None` for `Ctx<Unauthed>`.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

impl Ctx<Unauthed> {
    pub(crate) fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            principal: None,
            state: Unauthed::new(),
        }
    }

    /// Splits request metadata into a fresh context and the principal to
    /// authenticate with.
    pub(crate) fn from_meta(meta: RequestMeta) -> (Self, Option<Principal>) {
        (Self::new(meta.request_id), meta.principal)
    }

    /// Accepts the principal supplied by the authentication layer.
    ///
    /// # Errors
    ///
    /// Returns [`ViolationKind::Unauthenticated`] if there is no principal or
    /// the authentication layer did not accept it.
    pub fn authenticate(self, principal: Option<Principal>) -> Result<Ctx<Authed>, Violation> {
        match principal {
            Some(p) if p.is_authenticated => Ok(Ctx {
                request_id: self.request_id,
                principal: Some(p),
                state: Authed::new(),
            }),
            _ => Err(Violation::new(
                ViolationKind::Unauthenticated,
                UNAUTHORIZED_MESSAGE,
            )),
        }
    }
}

impl Ctx<Authed> {
    /// Resolves the partner the principal acts for.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's violation (unsupported method or unmapped
    /// principal).
    pub fn authorize(self, resolver: &AuthorizationResolver) -> Result<Ctx<Authorized>, Violation> {
        let principal = self.principal.ok_or_else(|| {
            Violation::new(ViolationKind::Unauthenticated, UNAUTHORIZED_MESSAGE)
        })?;
        let partner = resolver.resolve_partner(&principal)?;

        Ok(Ctx {
            request_id: self.request_id,
            principal: Some(principal),
            state: Authorized { partner },
        })
    }
}

impl Ctx<Authorized> {
    /// The partner resolved for this request.
    pub fn partner(&self) -> &PartnerId {
        &self.state.partner
    }

    /// Logger that tags every event with the request id and partner.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, Some(self.state.partner.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lookup::StaticLookup;

    fn resolver() -> AuthorizationResolver {
        AuthorizationResolver::new(Arc::new(
            StaticLookup::new().with("kevin@example.com", "TargetBase"),
        ))
    }

    #[test]
    fn unauthed_ctx_has_no_principal() {
        let ctx = Ctx::new("req-unauth");
        assert_eq!(ctx.request_id(), "req-unauth");
        assert!(ctx.principal().is_none());
    }

    #[test]
    fn authenticate_without_principal_fails() {
        let err = Ctx::new("req-1").authenticate(None).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn authenticate_rejects_unaccepted_principal() {
        let err = Ctx::new("req-1")
            .authenticate(Some(Principal::anonymous()))
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn full_state_progression() {
        let authed = Ctx::new("req-progression")
            .authenticate(Some(Principal::authenticated("kevin@example.com", "aad")))
            .unwrap();
        assert_eq!(authed.principal().unwrap().name, "kevin@example.com");

        let authorized = authed.authorize(&resolver()).unwrap();
        assert_eq!(authorized.request_id(), "req-progression");
        assert_eq!(authorized.partner().as_str(), "TargetBase");
        assert_eq!(authorized.log().partner(), Some("TargetBase"));
    }

    #[test]
    fn authorize_propagates_resolver_violation() {
        let authed = Ctx::new("req-2")
            .authenticate(Some(Principal::authenticated("kevin@example.com", "google")))
            .unwrap();

        let err = authed.authorize(&resolver()).unwrap_err();
        assert_eq!(err.kind, ViolationKind::UnsupportedAuthMethod);
    }

    #[test]
    fn from_meta_keeps_request_id() {
        let (ctx, principal) = Ctx::from_meta(RequestMeta {
            request_id: "req-meta".to_string(),
            principal: Some(Principal::anonymous()),
        });

        assert_eq!(ctx.request_id(), "req-meta");
        assert!(principal.is_some());
    }
}
