//! Extraction boundary traits for web integration.
//!
//! Framework integrations implement these for their own request types, or
//! fill in a [`RequestAdapter`](super::RequestAdapter) which implements both.

use crate::request::RequestMeta;

use super::TaintedInputs;

/// Extracts request metadata from a framework-specific request.
///
/// Only maps framework types to [`RequestMeta`]. It does not authenticate
/// the principal or resolve a partner; the orchestrator does both.
///
/// # Examples
///
/// ```
/// use feed_access::web::ExtractMetadata;
/// use feed_access::{Principal, RequestMeta};
///
/// struct FunctionRequest {
///     invocation_id: String,
///     user: Option<(String, String)>,
/// }
///
/// impl ExtractMetadata for FunctionRequest {
///     fn extract_metadata(&self) -> RequestMeta {
///         RequestMeta {
///             request_id: self.invocation_id.clone(),
///             principal: self
///                 .user
///                 .as_ref()
///                 .map(|(name, method)| Principal::authenticated(name.clone(), method.clone())),
///         }
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Returns the request id and the principal, if any.
    fn extract_metadata(&self) -> RequestMeta;
}

/// Extracts the untrusted request parameters.
///
/// Every value that crosses the HTTP boundary comes out as a
/// [`Tainted<String>`](crate::Tainted).
pub trait ExtractTaintedInputs {
    /// Collects query parameters and body fields.
    fn extract_tainted_inputs(&self) -> TaintedInputs;
}
