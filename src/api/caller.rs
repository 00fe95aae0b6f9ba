//! Request pipeline.
//!
//! # Responsibilities
//! - Turn `CallOptions` into a `RequestDescriptor` (path check, query
//!   flattening, content headers, timeout, request id)
//! - Attach a signature when asked, failing before any network attempt if
//!   the wallet cannot sign
//! - Run exactly one executor attempt and shape the outcome into an
//!   `ApiResponse` or a normalized error
//!
//! # Data Flow
//! ```text
//! get/post/... → call(CallOptions)
//!     → prepare()   descriptor + optional signature headers
//!     → dispatch()  executor, status check, JSON decode
//!     → shape()     JSON:API parse + link binding, or raw camelCase
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::context::{IdentityContext, IdentityOptions};
use crate::api::error::{ApiError, ApiResult, ExecutionFailure};
use crate::api::response::ApiResponse;
use crate::config::schema::ClientConfig;
use crate::http::case::camel_case_deep;
use crate::http::executor::{HttpExecutor, ReqwestExecutor};
use crate::http::jsonapi::parse_document;
use crate::http::request::{flatten_query, Method, RequestDescriptor};
use crate::http::signature::sign_request;
use crate::ledger::network::{NetworkBinding, NetworkDetails};
use crate::ledger::wallet::{Wallet, WalletCapability};
use crate::observability::metrics;

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything a single call can be parameterized with.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub endpoint: String,
    /// Overrides the context base URL for this call only.
    pub base_url: Option<String>,
    /// Query object, flattened JSON:API style.
    pub query: Option<Value>,
    pub data: Option<Value>,
    /// Extra headers, applied after the content headers.
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    pub with_credentials: bool,
    pub need_sign: bool,
    pub need_raw: bool,
    /// Overrides the context timeout for this call only.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            base_url: None,
            query: None,
            data: None,
            headers: HeaderMap::new(),
            content_type: None,
            with_credentials: true,
            need_sign: false,
            need_raw: false,
            timeout: None,
        }
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn signed(mut self, need_sign: bool) -> Self {
        self.need_sign = need_sign;
        self
    }

    pub fn raw(mut self, need_raw: bool) -> Self {
        self.need_raw = need_raw;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Client for the ledger API.
///
/// Cloning is cheap: the identity is copied and the executor is shared.
#[derive(Clone)]
pub struct ApiCaller {
    identity: IdentityContext,
    executor: Arc<dyn HttpExecutor>,
}

impl std::fmt::Debug for ApiCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCaller")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl ApiCaller {
    /// Caller over the default `reqwest` executor.
    pub fn new(identity: IdentityContext) -> Self {
        Self::with_executor(identity, Arc::new(ReqwestExecutor::new()))
    }

    pub fn with_executor(identity: IdentityContext, executor: Arc<dyn HttpExecutor>) -> Self {
        Self { identity, executor }
    }

    /// Caller targeting `base_url` with no wallet and no network binding.
    pub fn get_instance(base_url: impl Into<String>) -> Self {
        let mut identity = IdentityContext::default();
        identity.use_base_url(base_url);
        Self::new(identity)
    }

    /// Caller targeting `base_url`, bound to the network the server reports.
    pub async fn get_instance_with_passphrase(base_url: impl Into<String>) -> ApiResult<Self> {
        let mut caller = Self::get_instance(base_url);
        caller.discover_network().await?;
        Ok(caller)
    }

    /// Build a caller from loaded configuration.
    ///
    /// A wallet is attached when the configured environment variable holds a
    /// private key; its absence is not an error.
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let key_var = &config.wallet.private_key_env;
        let wallet = if std::env::var_os(key_var).is_some_and(|key| !key.is_empty()) {
            let mut wallet = Wallet::from_env(key_var)?;
            if let Some(account_id) = &config.wallet.account_id {
                wallet = wallet.with_account_id(account_id.clone());
            }
            Some(Arc::new(wallet) as Arc<dyn WalletCapability>)
        } else {
            tracing::debug!(variable = %key_var, "No wallet key in environment; signing disabled");
            None
        };

        let mut identity = IdentityContext::new(IdentityOptions {
            base_url: Some(config.api.base_url.clone()),
            wallet,
            passphrase: config.network.passphrase.clone(),
        })?;
        identity.use_timeout(Some(config.api.timeout()));
        identity.use_clock_skew(config.api.clock_skew_secs);

        let executor = ReqwestExecutor::new().with_default_timeout(config.api.timeout());
        Ok(Self::with_executor(identity, Arc::new(executor)))
    }

    /// Fetch the root document and bind to the network it describes.
    pub async fn discover_network(&mut self) -> ApiResult<&NetworkDetails> {
        let response = self.get_raw("/", None).await?;
        let details: NetworkDetails = serde_json::from_value(response.into_data()).map_err(|e| {
            ApiError::Precondition(format!("root document has no usable network details: {}", e))
        })?;
        if details.network_passphrase.trim().is_empty() {
            return Err(ApiError::Precondition(
                "root document has an empty network passphrase".into(),
            ));
        }

        if let Some(server_time) = details.current_time {
            let skew = server_time
                .checked_sub(chrono::Utc::now().timestamp())
                .ok_or_else(|| ApiError::Precondition(format!("server time {} out of range", server_time)))?;
            self.identity.use_clock_skew(skew);
        }
        self.identity.use_network_details(details);

        self.identity
            .network_details()
            .ok_or_else(|| ApiError::Precondition("network details were not stored".into()))
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn wallet(&self) -> Option<&Arc<dyn WalletCapability>> {
        self.identity.wallet()
    }

    pub fn network(&self) -> Option<&NetworkBinding> {
        self.identity.network()
    }

    pub fn network_details(&self) -> Option<&NetworkDetails> {
        self.identity.network_details()
    }

    pub fn use_wallet(&mut self, wallet: Arc<dyn WalletCapability>) -> ApiResult<()> {
        self.identity.use_wallet(wallet)
    }

    /// Copy of this caller signing with `wallet`; `self` is unchanged.
    pub fn with_wallet(&self, wallet: Arc<dyn WalletCapability>) -> ApiResult<Self> {
        Ok(Self {
            identity: self.identity.with_wallet(wallet)?,
            executor: Arc::clone(&self.executor),
        })
    }

    pub fn use_base_url(&mut self, base_url: impl Into<String>) {
        self.identity.use_base_url(base_url);
    }

    /// Copy of this caller targeting `base_url`; `self` is unchanged.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            identity: self.identity.with_base_url(base_url),
            executor: Arc::clone(&self.executor),
        }
    }

    pub fn use_passphrase(&mut self, passphrase: &str) {
        self.identity.use_passphrase(passphrase);
    }

    pub fn use_network_details(&mut self, details: NetworkDetails) {
        self.identity.use_network_details(details);
    }

    pub fn use_timeout(&mut self, timeout: Option<Duration>) {
        self.identity.use_timeout(timeout);
    }

    pub fn use_clock_skew(&mut self, seconds: i64) {
        self.identity.use_clock_skew(seconds);
    }

    pub async fn get(&self, endpoint: &str, query: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_query(CallOptions::new(Method::Get, endpoint), query)).await
    }

    /// GET without JSON:API parsing or link binding.
    pub async fn get_raw(&self, endpoint: &str, query: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_query(CallOptions::new(Method::Get, endpoint), query).raw(true))
            .await
    }

    pub async fn get_with_signature(&self, endpoint: &str, query: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_query(CallOptions::new(Method::Get, endpoint), query).signed(true))
            .await
    }

    pub async fn post(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Post, endpoint), data)).await
    }

    pub async fn post_with_signature(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Post, endpoint), data).signed(true))
            .await
    }

    pub async fn put(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Put, endpoint), data)).await
    }

    pub async fn put_with_signature(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Put, endpoint), data).signed(true))
            .await
    }

    pub async fn patch(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Patch, endpoint), data)).await
    }

    pub async fn patch_with_signature(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Patch, endpoint), data).signed(true))
            .await
    }

    pub async fn delete(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Delete, endpoint), data)).await
    }

    pub async fn delete_with_signature(&self, endpoint: &str, data: Option<Value>) -> ApiResult<ApiResponse> {
        self.call(with_data(CallOptions::new(Method::Delete, endpoint), data).signed(true))
            .await
    }

    /// Issue one call.
    ///
    /// Precondition failures (bad endpoint, missing base URL, unusable wallet
    /// for a signed call) are returned before the executor is touched.
    pub async fn call(&self, options: CallOptions) -> ApiResult<ApiResponse> {
        let need_raw = options.need_raw;
        let need_sign = options.need_sign;
        let descriptor = self.prepare(options)?;

        let request_id = descriptor
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        tracing::debug!(
            request_id = %request_id,
            method = %descriptor.method,
            path = %descriptor.path,
            signed = need_sign,
            "Calling ledger API"
        );

        let start_time = Instant::now();
        let outcome = self.dispatch(&descriptor).await;
        let label = match &outcome {
            Ok((status, _)) => status.to_string(),
            Err(ExecutionFailure::NoResponse(_)) => "no_response".to_string(),
            Err(ExecutionFailure::Status(response)) => response.status.to_string(),
            Err(ExecutionFailure::Decode { .. }) => "decode_error".to_string(),
        };
        metrics::record_call(descriptor.method.as_str(), &label, start_time);

        let (status, body) = outcome.map_err(|failure| {
            let error = ApiError::from(failure);
            tracing::warn!(
                request_id = %request_id,
                method = %descriptor.method,
                path = %descriptor.path,
                error = %error,
                "Ledger API call failed"
            );
            error
        })?;

        tracing::debug!(request_id = %request_id, status = status, "Ledger API call succeeded");
        Ok(self.shape(status, body, need_raw, need_sign))
    }

    pub(crate) fn prepare(&self, options: CallOptions) -> ApiResult<RequestDescriptor> {
        let base_url = options
            .base_url
            .or_else(|| self.identity.base_url().map(str::to_string))
            .ok_or_else(|| ApiError::Precondition("no base URL set".into()))?;

        let mut descriptor = RequestDescriptor::new(options.method, base_url, &options.endpoint)?;

        if let Some(query) = &options.query {
            descriptor.query = flatten_query(query);
        }

        descriptor.body = match options.data {
            Some(data) => Some(data),
            None if options.method.allows_empty_body() => None,
            None => Some(json!({})),
        };

        for (name, value) in options.headers.iter() {
            descriptor.headers.insert(name.clone(), value.clone());
        }
        if let Some(content_type) = &options.content_type {
            let value = HeaderValue::from_str(content_type)
                .map_err(|_| ApiError::Precondition(format!("invalid content type {:?}", content_type)))?;
            descriptor.headers.insert(CONTENT_TYPE, value);
        }

        descriptor.credentials = options.with_credentials;
        descriptor.timeout = options.timeout.or_else(|| self.identity.custom_timeout());

        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            descriptor.headers.insert(REQUEST_ID_HEADER, value);
        }

        if options.need_sign {
            let (keypair, account_id) = self.identity.signing_credentials()?;
            descriptor.headers = sign_request(&descriptor, keypair, account_id, self.identity.now())?;
        } else {
            descriptor.url()?;
            descriptor.body_bytes()?;
        }

        Ok(descriptor)
    }

    async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<(u16, Value), ExecutionFailure> {
        let response = self
            .executor
            .execute(descriptor)
            .await
            .map_err(ExecutionFailure::NoResponse)?;

        if !response.is_success() {
            return Err(ExecutionFailure::Status(response));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok((response.status, Value::Null));
        }

        match serde_json::from_slice(&response.body) {
            Ok(body) => Ok((response.status, body)),
            Err(error) => Err(ExecutionFailure::Decode { response, error }),
        }
    }

    fn shape(&self, status: u16, body: Value, need_raw: bool, need_sign: bool) -> ApiResponse {
        if need_raw {
            return ApiResponse::raw(status, camel_case_deep(body));
        }
        ApiResponse::from_document(status, parse_document(body), self, need_sign)
    }
}

fn with_query(options: CallOptions, query: Option<Value>) -> CallOptions {
    match query {
        Some(query) => options.query(query),
        None => options,
    }
}

fn with_data(options: CallOptions, data: Option<Value>) -> CallOptions {
    match data {
        Some(data) => options.data(data),
        None => options,
    }
}
