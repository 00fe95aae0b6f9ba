//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledger_api::api::{ApiCaller, IdentityContext, IdentityOptions};
use ledger_api::http::executor::{HttpExecutor, RawResponse, TransportFailure};
use ledger_api::http::RequestDescriptor;
use ledger_api::ledger::{Operation, Wallet, WalletCapability};

/// Anvil's first development key.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Anvil's second development key.
pub const OTHER_PRIVATE_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub const TEST_PASSPHRASE: &str = "Integration Test Network";

pub fn test_wallet() -> Arc<dyn WalletCapability> {
    Arc::new(Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap())
}

pub fn other_wallet() -> Arc<dyn WalletCapability> {
    Arc::new(Wallet::from_private_key(OTHER_PRIVATE_KEY).unwrap())
}

pub fn payment(amount: &str) -> Operation {
    Operation::new("payment", json!({"amount": amount, "destination": "BX_DEST"}))
}

/// Mock ledger with a root document at "/".
pub async fn start_mock_ledger() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "network_passphrase": TEST_PASSPHRASE,
            "master_account_id": "GA_MASTER",
            "current_time": chrono::Utc::now().timestamp(),
            "tx_expiration_period": 604800
        })))
        .mount(&server)
        .await;
    server
}

/// Caller over the real executor, pointed at `server`.
pub fn caller_for(server: &MockServer, wallet: Option<Arc<dyn WalletCapability>>) -> ApiCaller {
    let identity = IdentityContext::new(IdentityOptions {
        base_url: Some(server.uri()),
        wallet,
        passphrase: Some(TEST_PASSPHRASE.to_string()),
    })
    .unwrap();
    ApiCaller::new(identity)
}

/// Executor that records descriptors and replays queued responses.
#[derive(Default)]
pub struct RecordingExecutor {
    requests: Mutex<Vec<RequestDescriptor>>,
    responses: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_json(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body.to_string())));
    }

    pub fn fail(&self, failure: TransportFailure) {
        self.responses.lock().unwrap().push_back(Err(failure));
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpExecutor for RecordingExecutor {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<RawResponse, TransportFailure>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(200, "{}")));
        Box::pin(async move { next })
    }
}

/// Caller over a recording executor.
pub fn recording_caller(
    executor: Arc<RecordingExecutor>,
    wallet: Option<Arc<dyn WalletCapability>>,
) -> ApiCaller {
    let identity = IdentityContext::new(IdentityOptions {
        base_url: Some("https://ledger.test".into()),
        wallet,
        passphrase: Some(TEST_PASSPHRASE.to_string()),
    })
    .unwrap();
    ApiCaller::with_executor(identity, executor)
}
