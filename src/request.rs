/// Metadata about an incoming request.
///
/// Contains the request identifier and the principal attached by the
/// authentication layer in front of this crate, if any.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Caller identity, if the authentication layer supplied one
    pub principal: Option<Principal>,
}

/// The caller identity as reported by the authentication layer.
///
/// Never persisted; lives for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Login name, used as the key into the partner table
    pub name: String,
    /// Authentication method reported by the identity provider (e.g. `aad`)
    pub authentication_method: String,
    /// Whether the authentication layer accepted the caller
    pub is_authenticated: bool,
}

impl Principal {
    /// Creates an authenticated principal.
    pub fn authenticated(name: impl Into<String>, authentication_method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authentication_method: authentication_method.into(),
            is_authenticated: true,
        }
    }

    /// Creates the principal of a caller the authentication layer did not accept.
    pub fn anonymous() -> Self {
        Self {
            name: String::new(),
            authentication_method: String::new(),
            is_authenticated: false,
        }
    }
}
