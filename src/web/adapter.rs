//! Request adapter for mapping HTTP requests to feed-access types.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::request::{Principal, RequestMeta};
use crate::Tainted;

use super::{ExtractMetadata, ExtractTaintedInputs};

/// Framework-agnostic view of an incoming feed URL request.
///
/// Holds plain owned data so any HTTP framework can fill it in: the request
/// id, the principal reported by the authentication layer, the query pairs in
/// their original order, and the decoded JSON body.
///
/// # Examples
///
/// ```
/// use feed_access::web::{ExtractMetadata, ExtractTaintedInputs, RequestAdapter};
/// use feed_access::Principal;
///
/// let mut adapter = RequestAdapter::from_query_string("req-12345", "feed=Client&startdate=2024-01-05");
/// adapter.set_principal(Some(Principal::authenticated("kevin@example.com", "aad")));
/// adapter.set_json_body(br#"{"enddate": "2024-01-06"}"#).unwrap();
///
/// let meta = adapter.extract_metadata();
/// assert_eq!(meta.request_id, "req-12345");
///
/// let inputs = adapter.extract_tainted_inputs();
/// assert!(inputs.get("feed").is_some());
/// assert!(inputs.get("enddate").is_some());
/// assert!(inputs.get("other").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    principal: Option<Principal>,
    /// Query pairs in request order; duplicates are kept
    query_params: Vec<(String, String)>,
    body: Option<Map<String, Value>>,
}

impl RequestAdapter {
    /// Creates an adapter with no principal, query or body.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            principal: None,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Creates an adapter from a raw query string (with or without the
    /// leading `?`). Percent-escapes and `+` are decoded.
    pub fn from_query_string(request_id: impl Into<String>, query: &str) -> Self {
        let mut adapter = Self::new(request_id);
        adapter.query_params = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        adapter
    }

    /// Sets the principal reported by the authentication layer.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.principal = principal;
    }

    /// Appends a query parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.push((key.into(), value.into()));
    }

    /// Decodes a JSON object body.
    ///
    /// An empty or whitespace-only body leaves the adapter without a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBody`] if the bytes are not a JSON object.
    pub fn set_json_body(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            self.body = None;
            return Ok(());
        }

        let body: Map<String, Value> = serde_json::from_slice(bytes).map_err(Error::MalformedBody)?;
        self.body = Some(body);
        Ok(())
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal, if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id.clone(),
            principal: self.principal.clone(),
        }
    }
}

impl ExtractTaintedInputs for RequestAdapter {
    fn extract_tainted_inputs(&self) -> TaintedInputs {
        let body_fields = self
            .body
            .iter()
            .flat_map(|body| body.iter())
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), Tainted::new(s.to_string()))))
            .collect();

        TaintedInputs {
            query_params: self
                .query_params
                .iter()
                .map(|(k, v)| (k.clone(), Tainted::new(v.clone())))
                .collect(),
            body_fields,
        }
    }
}

/// Untrusted request parameters.
///
/// Every value is a [`Tainted<String>`] and has to pass a
/// [`Sanitizer`](crate::Sanitizer) before use.
#[derive(Debug, Clone, Default)]
pub struct TaintedInputs {
    query_params: Vec<(String, Tainted<String>)>,
    body_fields: Vec<(String, Tainted<String>)>,
}

impl TaintedInputs {
    /// First query parameter whose key matches `name` ignoring ASCII case.
    pub fn query_param(&self, name: &str) -> Option<Tainted<String>> {
        self.query_params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// String field `name` of the JSON body. Keys match exactly; non-string
    /// values are ignored.
    pub fn body_field(&self, name: &str) -> Option<Tainted<String>> {
        self.body_fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Query parameter `name`, falling back to the body field of the same
    /// name. A query parameter that is present but empty still wins.
    pub fn get(&self, name: &str) -> Option<Tainted<String>> {
        self.query_param(name).or_else(|| self.body_field(name))
    }

    /// Number of query parameters.
    pub fn query_len(&self) -> usize {
        self.query_params.len()
    }

    /// Number of string body fields.
    pub fn body_len(&self) -> usize {
        self.body_fields.len()
    }
}
