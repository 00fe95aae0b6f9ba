//! Transaction submission.
//!
//! # Responsibilities
//! - Build and sign transactions for the active wallet on the bound network
//! - Post envelopes through one submission path (`post_tx_envelope`)
//!
//! Every wallet-dependent entry point checks the wallet before doing anything
//! else, and the submission path reuses the request pipeline in raw mode so
//! its failures normalize like any other call.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::api::caller::{ApiCaller, CallOptions};
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::ApiResponse;
use crate::http::executor::DEFAULT_TIMEOUT;
use crate::http::request::Method;
use crate::ledger::builder::{TransactionBuilder, TxOptions};
use crate::ledger::transaction::Transaction;
use crate::ledger::types::Operation;
use crate::observability::metrics;

/// Submission timeout; ingest may take much longer than a regular call.
pub const SUBMIT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT.as_secs() * 10);

pub const DEFAULT_TRANSACTIONS_ENDPOINT: &str = "/v3/transactions";

/// How an envelope is posted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionParams {
    pub endpoint: String,
    /// Ask the server to wait until the transaction is ingested.
    pub wait_for_ingest: bool,
    /// Sign the outer HTTP request as well as the transaction.
    pub need_sign_request: bool,
    /// Wrap the body as `{data: {attributes: ...}}`.
    #[serde(alias = "jsonApiWrap")]
    pub json_api: bool,
}

impl Default for SubmissionParams {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TRANSACTIONS_ENDPOINT.to_string(),
            wait_for_ingest: true,
            need_sign_request: false,
            json_api: false,
        }
    }
}

impl SubmissionParams {
    /// Read params from an untyped object; missing fields take defaults.
    pub fn from_value(value: &Value) -> ApiResult<Self> {
        if !value.is_object() {
            return Err(ApiError::Precondition(format!(
                "submission params should be an object, got {}",
                json_type(value)
            )));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| ApiError::Precondition(format!("invalid submission params: {}", e)))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ApiCaller {
    /// Build and sign a transaction from `operations`, returning its envelope.
    pub fn get_transaction(&self, operations: Vec<Operation>) -> ApiResult<String> {
        let tx = self.get_built_transaction(operations, TxOptions::default())?;
        Ok(tx.to_envelope()?)
    }

    /// Build and sign a transaction without serializing it.
    pub fn get_built_transaction(
        &self,
        operations: Vec<Operation>,
        options: TxOptions,
    ) -> ApiResult<Transaction> {
        let (keypair, account_id) = self.identity().signing_credentials()?;
        let network = self.identity().require_network()?;

        let tx = TransactionBuilder::new(account_id)
            .with_options(options)
            .at_time(self.identity().now())
            .add_operations(operations)
            .add_signer(keypair.clone())
            .build(network)?;
        Ok(tx)
    }

    /// Add the wallet's signature to an already built transaction.
    pub fn sign_transaction(&self, mut tx: Transaction) -> ApiResult<String> {
        let (keypair, _) = self.identity().signing_credentials()?;
        tx.sign(keypair)?;
        Ok(tx.to_envelope()?)
    }

    pub async fn sign_and_send_transaction(
        &self,
        tx: Transaction,
        wait_for_ingest: bool,
        endpoint: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let envelope = self.sign_transaction(tx)?;
        let mut params = SubmissionParams {
            wait_for_ingest,
            ..SubmissionParams::default()
        };
        if let Some(endpoint) = endpoint {
            params.endpoint = endpoint.to_string();
        }
        self.post_tx_envelope(&envelope, &params).await
    }

    /// Build, sign and submit `operations` with default params.
    pub async fn post_operations(&self, operations: Vec<Operation>) -> ApiResult<ApiResponse> {
        self.submit_operations(&SubmissionParams::default(), operations).await
    }

    /// Build, sign and submit `operations`; `params` must be a JSON object.
    pub async fn post_operations_parametrized(
        &self,
        params: &Value,
        operations: Vec<Operation>,
    ) -> ApiResult<ApiResponse> {
        let params = SubmissionParams::from_value(params)?;
        self.submit_operations(&params, operations).await
    }

    async fn submit_operations(
        &self,
        params: &SubmissionParams,
        operations: Vec<Operation>,
    ) -> ApiResult<ApiResponse> {
        let envelope = self.get_transaction(operations)?;
        self.post_tx_envelope(&envelope, params).await
    }

    /// Post an envelope. The response payload is camelCased and carries no links.
    pub async fn post_tx_envelope(&self, envelope: &str, params: &SubmissionParams) -> ApiResult<ApiResponse> {
        let mut body = json!({
            "tx": envelope,
            "wait_for_ingest": params.wait_for_ingest,
        });
        if params.json_api {
            body = json!({ "data": { "attributes": body } });
        }

        let options = CallOptions::new(Method::Post, params.endpoint.as_str())
            .data(body)
            .timeout(SUBMIT_TRANSACTION_TIMEOUT)
            .with_credentials(params.need_sign_request)
            .signed(params.need_sign_request)
            .raw(true);

        tracing::info!(
            endpoint = %params.endpoint,
            wait_for_ingest = params.wait_for_ingest,
            signed = params.need_sign_request,
            "Submitting transaction"
        );

        let start_time = Instant::now();
        let result = self.call(options).await;
        let outcome = match &result {
            Ok(_) => "success".to_string(),
            Err(e) => e.kind().to_string(),
        };
        metrics::record_submission(&outcome, start_time);

        match &result {
            Ok(response) => {
                tracing::info!(endpoint = %params.endpoint, status = response.status(), "Transaction submitted")
            }
            Err(e) => tracing::warn!(endpoint = %params.endpoint, error = %e, "Transaction submission failed"),
        }
        result
    }
}
