//! Error taxonomy and failure normalization.
//!
//! # Responsibilities
//! - `ApiError`: the one error type every public operation returns
//! - `NormalizedError`: the single shape all transport/HTTP failures converge to
//! - Classify failures: no response, structured HTTP error, unstructured HTTP
//!   error, undecodable success body
//!
//! # Design Decisions
//! - A `NormalizedError` can only be built from an `ExecutionFailure`, never
//!   from a successful response
//! - The raw failure is kept as `source()` and never exposed otherwise

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::http::executor::{RawResponse, TransportFailure};
use crate::ledger::types::LedgerError;

/// Longest body excerpt carried in an unstructured error detail.
const MAX_DETAIL_LEN: usize = 512;

/// What went wrong, for callers that branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raised locally before any network attempt.
    Precondition,
    /// No response was received (connect error, timeout).
    Network,
    /// The server answered with an error status.
    Http,
    /// The server answered successfully but the body could not be decoded.
    Decode,
    /// Local transaction encoding or signing failed.
    Ledger,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Precondition => "precondition",
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Decode => "decode",
            ErrorKind::Ledger => "ledger",
        };
        f.write_str(name)
    }
}

/// Coarse classification of HTTP error statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorClass {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Server,
    Other,
}

impl HttpErrorClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => HttpErrorClass::BadRequest,
            401 => HttpErrorClass::Unauthorized,
            403 => HttpErrorClass::Forbidden,
            404 => HttpErrorClass::NotFound,
            409 => HttpErrorClass::Conflict,
            500..=599 => HttpErrorClass::Server,
            _ => HttpErrorClass::Other,
        }
    }
}

/// One entry of a JSON:API `errors` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// Everything the executor step can fail with.
#[derive(Debug)]
pub enum ExecutionFailure {
    /// No response obtained.
    NoResponse(TransportFailure),
    /// Response with a non-2xx status.
    Status(RawResponse),
    /// 2xx response whose body is not JSON.
    Decode {
        response: RawResponse,
        error: serde_json::Error,
    },
}

/// Error status as received; the `source()` of HTTP normalized errors.
#[derive(Debug, Error)]
#[error("server responded with status {status}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

/// The single error shape for transport and HTTP failures.
#[derive(Debug)]
pub struct NormalizedError {
    kind: ErrorKind,
    status: Option<u16>,
    detail: String,
    errors: Vec<ErrorObject>,
    timed_out: bool,
    cause: Box<dyn std::error::Error + Send + Sync>,
}

impl NormalizedError {
    /// Normalize an executor failure.
    pub fn from_failure(failure: ExecutionFailure) -> Self {
        match failure {
            ExecutionFailure::NoResponse(transport) => Self {
                kind: ErrorKind::Network,
                status: None,
                detail: transport.message().to_string(),
                errors: Vec::new(),
                timed_out: transport.is_timeout(),
                cause: Box::new(transport),
            },
            ExecutionFailure::Status(response) => Self::from_status(response),
            ExecutionFailure::Decode { response, error } => Self {
                kind: ErrorKind::Decode,
                status: Some(response.status),
                detail: format!("response body is not valid JSON: {}", error),
                errors: Vec::new(),
                timed_out: false,
                cause: Box::new(error),
            },
        }
    }

    fn from_status(response: RawResponse) -> Self {
        let text = response.text();
        let errors = structured_errors(&response.body);

        let detail = match errors.first() {
            Some(first) => first
                .detail
                .clone()
                .or_else(|| first.title.clone())
                .unwrap_or_else(|| status_reason(response.status)),
            None => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    status_reason(response.status)
                } else {
                    truncate(trimmed, MAX_DETAIL_LEN)
                }
            }
        };

        Self {
            kind: ErrorKind::Http,
            status: Some(response.status),
            detail,
            errors,
            timed_out: false,
            cause: Box::new(HttpStatusError {
                status: response.status,
                body: text,
            }),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Structured JSON:API errors; empty for unstructured bodies.
    pub fn errors(&self) -> &[ErrorObject] {
        &self.errors
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn http_class(&self) -> Option<HttpErrorClass> {
        match self.kind {
            ErrorKind::Http => self.status.map(HttpErrorClass::from_status),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error (status {}): {}", self.kind, status, self.detail),
            None => write!(f, "{} error: {}", self.kind, self.detail),
        }
    }
}

impl std::error::Error for NormalizedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

fn structured_errors(body: &[u8]) -> Vec<ErrorObject> {
    #[derive(Deserialize)]
    struct ErrorDocument {
        errors: Vec<ErrorObject>,
    }

    serde_json::from_slice::<ErrorDocument>(body)
        .map(|doc| doc.errors)
        .unwrap_or_default()
}

fn status_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Error returned by every public operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Local precondition violated; nothing was sent.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Transport or HTTP failure, normalized.
    #[error(transparent)]
    Request(#[from] NormalizedError),

    /// Local transaction encoding/signing failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Precondition(_) => ErrorKind::Precondition,
            ApiError::Request(normalized) => normalized.kind(),
            ApiError::Ledger(_) => ErrorKind::Ledger,
        }
    }

    pub fn as_normalized(&self) -> Option<&NormalizedError> {
        match self {
            ApiError::Request(normalized) => Some(normalized),
            _ => None,
        }
    }
}

impl From<ExecutionFailure> for ApiError {
    fn from(failure: ExecutionFailure) -> Self {
        ApiError::Request(NormalizedError::from_failure(failure))
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
