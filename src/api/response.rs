//! Response shaping and link binding.
//!
//! A non-raw response carries its top-level links as `BoundLink`s. Each one
//! owns a copy of the caller as it was when the response arrived, plus the
//! signing mode of the call that produced it, so following a link later
//! behaves exactly like the original call did.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::api::caller::{ApiCaller, CallOptions};
use crate::api::error::{ApiError, ApiResult};
use crate::http::jsonapi::Document;
use crate::http::request::Method;

/// Outcome of a successful call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    data: Value,
    meta: Value,
    links: BTreeMap<String, BoundLink>,
}

impl ApiResponse {
    /// Deep-normalized payload with no links.
    pub(crate) fn raw(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            meta: Value::Null,
            links: BTreeMap::new(),
        }
    }

    pub(crate) fn from_document(status: u16, document: Document, caller: &ApiCaller, signed: bool) -> Self {
        let links = document
            .links
            .into_iter()
            .map(|(name, href)| {
                let link = BoundLink {
                    name: name.clone(),
                    href,
                    signed,
                    caller: caller.clone(),
                };
                (name, link)
            })
            .collect();

        Self {
            status,
            data: document.data,
            meta: document.meta,
            links,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn meta(&self) -> &Value {
        &self.meta
    }

    pub fn links(&self) -> &BTreeMap<String, BoundLink> {
        &self.links
    }

    pub fn link(&self, name: &str) -> Option<&BoundLink> {
        self.links.get(name)
    }

    /// Follow the link called `name`, e.g. `"next"` for pagination.
    pub async fn fetch_link(&self, name: &str) -> ApiResult<ApiResponse> {
        let link = self
            .link(name)
            .ok_or_else(|| ApiError::Precondition(format!("response has no {:?} link", name)))?;
        link.fetch().await
    }
}

/// A response link ready to be followed.
#[derive(Debug, Clone)]
pub struct BoundLink {
    name: String,
    href: String,
    signed: bool,
    caller: ApiCaller,
}

impl BoundLink {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Whether following this link signs the request.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// GET the link target with the signing mode of the originating call.
    pub async fn fetch(&self) -> ApiResult<ApiResponse> {
        let target = LinkTarget::parse(&self.href)?;
        tracing::debug!(link = %self.name, href = %self.href, "Following response link");

        let mut options = CallOptions::new(Method::Get, target.path).signed(self.signed);
        if !target.query.is_empty() {
            options = options.query(Value::Object(target.query));
        }
        if let Some(origin) = target.origin {
            options = options.base_url(origin);
        }
        self.caller.call(options).await
    }
}

/// A link href split into what `CallOptions` needs.
#[derive(Debug, PartialEq)]
struct LinkTarget {
    origin: Option<String>,
    path: String,
    query: Map<String, Value>,
}

impl LinkTarget {
    fn parse(href: &str) -> ApiResult<Self> {
        if href.starts_with("http://") || href.starts_with("https://") {
            let url = url::Url::parse(href)
                .map_err(|e| ApiError::Precondition(format!("invalid link {:?}: {}", href, e)))?;
            return Ok(Self {
                origin: Some(url.origin().ascii_serialization()),
                path: url.path().to_string(),
                query: parse_query(url.query().unwrap_or("")),
            });
        }

        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        Ok(Self {
            origin: None,
            path: path.to_string(),
            query: parse_query(query),
        })
    }
}

fn parse_query(query: &str) -> Map<String, Value> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::context::{IdentityContext, IdentityOptions};
    use crate::http::executor::mock::RecordingExecutor;
    use crate::http::signature::SIGNATURE_HEADER;
    use crate::ledger::wallet::{Wallet, WalletCapability};
    use serde_json::json;
    use std::sync::Arc;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signing_caller(executor: Arc<RecordingExecutor>) -> ApiCaller {
        let wallet: Arc<dyn WalletCapability> = Arc::new(Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap());
        let identity = IdentityContext::new(IdentityOptions {
            base_url: Some("https://api.test".into()),
            wallet: Some(wallet),
            passphrase: None,
        })
        .unwrap();
        ApiCaller::with_executor(identity, executor)
    }

    fn page(next: &str) -> Value {
        json!({"data": [], "links": {"next": next}})
    }

    #[test]
    fn test_link_target_relative() {
        let target = LinkTarget::parse("/v3/accounts?page%5Bnumber%5D=2&include=balances").unwrap();
        assert_eq!(target.origin, None);
        assert_eq!(target.path, "/v3/accounts");
        assert_eq!(target.query["page[number]"], "2");
        assert_eq!(target.query["include"], "balances");
    }

    #[test]
    fn test_link_target_absolute() {
        let target = LinkTarget::parse("https://cdn.test:8443/v3/x?a=b").unwrap();
        assert_eq!(target.origin.as_deref(), Some("https://cdn.test:8443"));
        assert_eq!(target.path, "/v3/x");
        assert_eq!(target.query["a"], "b");
    }

    #[tokio::test]
    async fn test_signed_link_stays_signed() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.respond_json(200, page("/v3/accounts?page[number]=1"));
        executor.respond_json(200, page("/v3/accounts?page[number]=2"));
        let api = signing_caller(executor.clone());

        let first = api.get_with_signature("/v3/accounts", None).await.unwrap();
        assert!(first.link("next").unwrap().is_signed());

        let second = first.fetch_link("next").await.unwrap();
        assert!(second.link("next").unwrap().is_signed());

        let requests = executor.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path_and_query().unwrap(), "/v3/accounts?page[number]=1");
        assert!(requests[1].headers.get(SIGNATURE_HEADER).is_some());
    }

    #[tokio::test]
    async fn test_unsigned_link_stays_unsigned() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.respond_json(200, page("/v3/accounts?page[number]=1"));
        let api = signing_caller(executor.clone());

        let first = api.get("/v3/accounts", None).await.unwrap();
        first.fetch_link("next").await.unwrap();

        let requests = executor.requests();
        assert!(requests[1].headers.get(SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_link_uses_snapshot() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.respond_json(200, page("/v3/next"));
        let mut api = signing_caller(executor.clone());

        let first = api.get("/v3/accounts", None).await.unwrap();
        api.use_base_url("https://moved.test");
        first.fetch_link("next").await.unwrap();

        assert_eq!(executor.requests()[1].url().unwrap().as_str(), "https://api.test/v3/next");
    }

    #[tokio::test]
    async fn test_missing_link() {
        let executor = Arc::new(RecordingExecutor::new());
        executor.respond_json(200, json!({"data": null}));
        let api = signing_caller(executor.clone());

        let response = api.get("/v3/accounts/1", None).await.unwrap();
        let err = response.fetch_link("next").await.unwrap_err();
        assert!(matches!(err, ApiError::Precondition(_)));
        assert_eq!(executor.requests().len(), 1);
    }
}
