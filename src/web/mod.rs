//! Web framework integration surface.
//!
//! The boundary between an HTTP host and the feed-access pipeline:
//! - mapping requests to [`RequestMeta`](crate::RequestMeta)
//! - wrapping every query parameter and body field in [`Tainted`](crate::Tainted)
//! - turning results and errors into status codes and bodies
//!
//! Nothing here depends on a particular framework. An integration builds a
//! [`RequestAdapter`] from its own request type (or implements the extraction
//! traits directly) and hands it to a [`FeedUrlsHandler`].
//!
//! ```ignore
//! // Inside a framework route:
//! let mut adapter = RequestAdapter::from_query_string(invocation_id, req.query());
//! adapter.set_principal(principal_from_auth_headers(&req));
//! adapter.set_json_body(&body_bytes)?;
//!
//! let response = handler.handle(&adapter).await;
//! reply(response.status, response.content_type, response.body)
//! ```

mod adapter;
mod extract;
mod handler;

pub use adapter::{RequestAdapter, TaintedInputs};
pub use extract::{ExtractMetadata, ExtractTaintedInputs};
pub use handler::{FeedUrlsHandler, HttpResponse};
