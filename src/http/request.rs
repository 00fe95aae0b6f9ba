//! Request descriptors and their deterministic wire form.
//!
//! # Responsibilities
//! - Describe one outbound call (method, path, query, body, headers, limits)
//! - Flatten JSON:API query objects (`{filter: {type: "a"}}` → `filter[type]=a`)
//! - Produce the exact path+query and body bytes that get signed AND sent
//!
//! # Design Decisions
//! - Query keys keep their brackets verbatim; values are encoded like
//!   `encodeURIComponent`
//! - The signed target is read back from the parsed `Url`, the same value the
//!   executor sends, so URL normalization cannot make them differ
//! - Body bytes come from one serializer call site, shared by signer and executor

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};

/// JSON:API media type used for content negotiation.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Response size limit. Large enough to never trip on transaction payloads.
pub const MAX_CONTENT_LENGTH: u64 = 100_000_000_000;

/// Request body size limit.
pub const MAX_BODY_LENGTH: u64 = 1_000_000_000_000;

/// HTTP methods the API speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// GET and DELETE may go out without a body.
    pub fn allows_empty_body(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Transport-ready description of a single call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub base_url: String,
    /// Always starts with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    /// Whether credentials (cookies) accompany the request.
    pub credentials: bool,
    /// Overrides the executor's default timeout.
    pub timeout: Option<Duration>,
    pub max_content_length: u64,
    pub max_body_length: u64,
}

impl RequestDescriptor {
    /// Create a descriptor with JSON:API content headers and unbounded limits.
    ///
    /// Fails when `path` does not start with `/`.
    pub fn new(method: Method, base_url: impl Into<String>, path: &str) -> ApiResult<Self> {
        ensure_endpoint(path)?;

        Ok(Self {
            method,
            base_url: base_url.into(),
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            headers: content_headers(),
            credentials: true,
            timeout: None,
            max_content_length: MAX_CONTENT_LENGTH,
            max_body_length: MAX_BODY_LENGTH,
        })
    }

    /// `key=value` pairs joined by `&`; keys keep their brackets, everything
    /// else is percent-encoded.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| format!("{}={}", encode_key(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full URL the executor targets, as normalized by the URL parser.
    pub fn url(&self) -> ApiResult<reqwest::Url> {
        let mut joined = format!("{}{}", self.base_url.trim_end_matches('/'), self.path);
        if !self.query.is_empty() {
            joined.push('?');
            joined.push_str(&self.query_string());
        }
        reqwest::Url::parse(&joined)
            .map_err(|e| ApiError::Precondition(format!("invalid request URL {:?}: {}", joined, e)))
    }

    /// Request target as signed and sent, e.g. `/v3/accounts?page[limit]=10`.
    ///
    /// Taken from the parsed URL so it matches what goes on the wire byte
    /// for byte.
    pub fn path_and_query(&self) -> ApiResult<String> {
        let url = self.url()?;
        Ok(match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
    }

    /// Serialized body, `None` when the request carries no body.
    pub fn body_bytes(&self) -> ApiResult<Option<Vec<u8>>> {
        match &self.body {
            None => Ok(None),
            Some(body) => serde_json::to_vec(body)
                .map(Some)
                .map_err(|e| ApiError::Precondition(format!("body is not serializable: {}", e))),
        }
    }
}

/// Reject endpoints that do not start with `/`.
pub fn ensure_endpoint(endpoint: &str) -> ApiResult<()> {
    if !endpoint.starts_with('/') {
        return Err(ApiError::Precondition(format!(
            "endpoint should start with \"/\", got {:?}",
            endpoint
        )));
    }
    Ok(())
}

/// JSON:API content negotiation headers.
pub fn content_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_CONTENT_TYPE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API_CONTENT_TYPE));
    headers
}

/// Flatten a query object into JSON:API style pairs.
///
/// Nested objects become bracketed keys, arrays become comma-separated
/// lists and nulls are dropped. Anything other than an object yields no pairs.
pub fn flatten_query(query: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = query {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten_into(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (sub, nested) in map {
                flatten_into(format!("{}[{}]", key, sub), nested, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.push((key, joined));
        }
        scalar => {
            if let Some(s) = scalar_to_string(scalar) {
                out.push((key, s));
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Percent-encode a query key, leaving JSON:API brackets readable.
pub fn encode_key(key: &str) -> String {
    key.split(['[', ']'])
        .map(encode_component)
        .zip(key.match_indices(['[', ']']).map(|(_, b)| b).chain(std::iter::once("")))
        .map(|(part, bracket)| format!("{}{}", part, bracket))
        .collect()
}

/// Percent-encode like `encodeURIComponent`.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
