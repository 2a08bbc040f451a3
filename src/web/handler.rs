//! HTTP handler for the feed URL endpoint.

use crate::error::{Error, GENERIC_INTERNAL_MESSAGE};
use crate::orchestrator::{FeedAccessOrchestrator, FeedUrlsResponse};
use crate::request::Principal;

use super::{ExtractMetadata, ExtractTaintedInputs, RequestAdapter};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Framework-agnostic HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Value for the `Content-Type` header
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    /// Maps a failed request to its response.
    ///
    /// - authorization failures: 401 with the reason
    /// - invalid arguments: 400 with the reason
    /// - anything else: 400 with [`GENERIC_INTERNAL_MESSAGE`]
    pub fn from_error(err: &Error) -> Self {
        match err.violation() {
            Some(v) if v.is_authorization_failure() => Self::text(401, v.message.clone()),
            Some(v) => Self::text(400, v.message.clone()),
            None => Self::text(400, GENERIC_INTERNAL_MESSAGE),
        }
    }

    /// 200 response carrying `payload` as JSON.
    pub fn from_payload(payload: &FeedUrlsResponse) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status: 200,
                content_type: APPLICATION_JSON,
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                Self::text(400, GENERIC_INTERNAL_MESSAGE)
            }
        }
    }
}

/// Serves the feed URL endpoint on top of a [`FeedAccessOrchestrator`].
///
/// # Examples
///
/// ```
/// # futures::executor::block_on(async {
/// use std::sync::Arc;
/// use feed_access::web::FeedUrlsHandler;
/// use feed_access::{FeedAccessOrchestrator, MemoryBlobStore, StaticLookup};
///
/// let orchestrator = FeedAccessOrchestrator::new(
///     Arc::new(StaticLookup::new()),
///     Arc::new(StaticLookup::new()),
///     Arc::new(MemoryBlobStore::new("https://feeds.example.com", "partners")),
/// );
/// let handler = FeedUrlsHandler::new(orchestrator);
///
/// let response = handler.respond("req-1", None, "feed=client", b"").await;
/// assert_eq!(response.status, 401);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FeedUrlsHandler {
    orchestrator: FeedAccessOrchestrator,
}

impl FeedUrlsHandler {
    /// Creates a handler.
    pub fn new(orchestrator: FeedAccessOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Handles a request already mapped into a [`RequestAdapter`].
    pub async fn handle(&self, adapter: &RequestAdapter) -> HttpResponse {
        let meta = adapter.extract_metadata();
        let inputs = adapter.extract_tainted_inputs();

        match self.orchestrator.handle(meta, &inputs).await {
            Ok(payload) => HttpResponse::from_payload(&payload),
            Err(err) => HttpResponse::from_error(&err),
        }
    }

    /// Handles a request given as raw parts.
    ///
    /// A body that is not a JSON object is an internal failure and gets the
    /// generic message.
    pub async fn respond(
        &self,
        request_id: &str,
        principal: Option<Principal>,
        query: &str,
        body: &[u8],
    ) -> HttpResponse {
        let mut adapter = RequestAdapter::from_query_string(request_id, query);
        adapter.set_principal(principal);

        if let Err(err) = adapter.set_json_body(body) {
            tracing::error!(request_id, error = %err, "rejecting request body");
            return HttpResponse::from_error(&err);
        }

        self.handle(&adapter).await
    }
}
