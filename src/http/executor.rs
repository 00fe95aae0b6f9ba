//! HTTP execution.
//!
//! # Responsibilities
//! - Send one `RequestDescriptor` and return the raw response, whatever its status
//! - Report "no response" (connect errors, timeouts) as `TransportFailure`
//! - Enforce the descriptor's timeout and size limits
//! - Strip cookies from requests sent without credentials
//!
//! # Design Decisions
//! - Exactly one attempt per call; there is no retry layer
//! - The executor is a trait object so callers can swap the engine (tests, proxies)

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, COOKIE};
use std::time::Duration;
use thiserror::Error;

use crate::http::request::RequestDescriptor;

/// Timeout applied when neither the context nor the call sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Response as received, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// No response was obtained from the server.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportFailure {
    message: String,
    timed_out: bool,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
            source: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Engine that performs the actual network exchange.
pub trait HttpExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<RawResponse, TransportFailure>>;
}

/// Default executor backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestExecutor {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportFailure> {
        let url = request
            .url()
            .map_err(|e| TransportFailure::new(e.to_string()))?;
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut headers = request.headers.clone();
        if !request.credentials {
            headers.remove(COOKIE);
        }

        let mut builder = self
            .client
            .request(request.method.into(), url.clone())
            .headers(headers)
            .timeout(timeout);

        let body = request
            .body_bytes()
            .map_err(|e| TransportFailure::new(e.to_string()))?;
        if let Some(body) = body {
            if body.len() as u64 > request.max_body_length {
                return Err(TransportFailure::new(format!(
                    "request body of {} bytes exceeds limit",
                    body.len()
                )));
            }
            builder = builder.body(body);
        }

        tracing::debug!(
            method = %request.method,
            url = %url,
            timeout_ms = timeout.as_millis() as u64,
            "Dispatching request"
        );

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if body.len() as u64 > request.max_content_length {
            return Err(TransportFailure::new(format!(
                "response body of {} bytes exceeds limit",
                body.len()
            )));
        }

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

impl Default for ReqwestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<RawResponse, TransportFailure>> {
        Box::pin(self.send(request))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportFailure {
    let failure = if e.is_timeout() {
        TransportFailure::timeout("request timed out")
    } else if e.is_connect() {
        TransportFailure::new("connection failed")
    } else {
        TransportFailure::new("no response received")
    };
    failure.with_source(e)
}
