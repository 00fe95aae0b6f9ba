//! Transaction building and submission against a mock ledger.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

use ledger_api::api::{ApiCaller, ErrorKind, SubmissionParams, SUBMIT_TRANSACTION_TIMEOUT};
use ledger_api::ledger::{NetworkBinding, Transaction, TxOptions};

mod common;

#[tokio::test]
async fn test_post_operations_end_to_end() {
    let server = common::start_mock_ledger().await;
    Mock::given(method("POST"))
        .and(path("/v3/transactions"))
        .and(body_partial_json(json!({"wait_for_ingest": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "transactions",
                "id": "tx-hash",
                "attributes": {"envelope_xdr": "AAAA", "result_xdr": "BBBB", "ledger_sequence": 42}
            },
            "links": {"self": "/v3/transactions/tx-hash"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut api = ApiCaller::get_instance(server.uri());
    api.use_wallet(common::test_wallet()).unwrap();
    api.discover_network().await.unwrap();

    let response = api
        .post_operations(vec![common::payment("10"), common::payment("20")])
        .await
        .unwrap();

    assert_eq!(response.data()["data"]["attributes"]["ledgerSequence"], 42);
    assert!(response.links().is_empty());

    let requests = server.received_requests().await.unwrap();
    let submitted = requests.iter().find(|r| r.url.path() == "/v3/transactions").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&submitted.body).unwrap();
    let tx = Transaction::from_envelope(
        body["tx"].as_str().unwrap(),
        &NetworkBinding::from_passphrase(common::TEST_PASSPHRASE),
    )
    .unwrap();
    assert_eq!(tx.operations().len(), 2);
    assert_eq!(tx.source(), common::test_wallet().account_id());
}

#[tokio::test]
async fn test_json_api_wrap_body_shape() {
    let executor = common::RecordingExecutor::new();
    let api = common::recording_caller(executor.clone(), Some(common::test_wallet()));

    api.post_operations_parametrized(
        &json!({"waitForIngest": false, "jsonApiWrap": true}),
        vec![common::payment("1")],
    )
    .await
    .unwrap();

    let body = executor.requests()[0].body.clone().unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    let attributes = body["data"]["attributes"].as_object().unwrap();
    assert_eq!(attributes.len(), 2);
    assert!(attributes["tx"].is_string());
    assert_eq!(attributes["wait_for_ingest"], false);
}

#[tokio::test]
async fn test_post_tx_envelope_default_target_and_timeout() {
    let executor = common::RecordingExecutor::new();
    let api = common::recording_caller(executor.clone(), None);

    api.post_tx_envelope("AAAA...", &SubmissionParams::default())
        .await
        .unwrap();

    let request = &executor.requests()[0];
    assert_eq!(request.url().unwrap().as_str(), "https://ledger.test/v3/transactions");
    assert_eq!(request.body, Some(json!({"tx": "AAAA...", "wait_for_ingest": true})));
    assert_eq!(request.timeout, Some(SUBMIT_TRANSACTION_TIMEOUT));
}

#[tokio::test]
async fn test_signed_submission_request() {
    let server = common::start_mock_ledger().await;
    Mock::given(method("POST"))
        .and(path("/v3/transactions"))
        .and(header_exists("signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "h"}})))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::caller_for(&server, Some(common::test_wallet()));
    let params = SubmissionParams::from_value(&json!({"needSignRequest": true})).unwrap();
    api.post_tx_envelope("AAAA", &params).await.unwrap();
}

#[tokio::test]
async fn test_rejected_transaction_is_normalized() {
    let server = common::start_mock_ledger().await;
    Mock::given(method("POST"))
        .and(path("/v3/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{
                "title": "Bad Request",
                "detail": "Transaction failed",
                "status": "400",
                "meta": {"extras": {"result_codes": {"transaction": "tx_failed"}}}
            }]
        })))
        .mount(&server)
        .await;

    let api = common::caller_for(&server, Some(common::test_wallet()));
    let err = api.post_operations(vec![common::payment("1")]).await.unwrap_err();

    let normalized = err.as_normalized().unwrap();
    assert_eq!(normalized.kind(), ErrorKind::Http);
    assert_eq!(normalized.status(), Some(400));
    assert_eq!(normalized.detail(), "Transaction failed");
    assert_eq!(
        normalized.errors()[0].meta.as_ref().unwrap()["extras"]["result_codes"]["transaction"],
        "tx_failed"
    );
}

#[test]
fn test_wallet_checks_come_first() {
    let executor = common::RecordingExecutor::new();
    let api = common::recording_caller(executor.clone(), None);

    assert_eq!(
        api.get_transaction(vec![common::payment("1")]).unwrap_err().kind(),
        ErrorKind::Precondition
    );
    assert_eq!(
        api.get_built_transaction(vec![common::payment("1")], TxOptions::default())
            .unwrap_err()
            .kind(),
        ErrorKind::Precondition
    );
    assert!(executor.requests().is_empty());
}

#[test]
fn test_two_callers_on_different_networks() {
    let executor = common::RecordingExecutor::new();
    let a = common::recording_caller(executor.clone(), Some(common::test_wallet()));
    let mut b = a.clone();
    b.use_passphrase("Another Network");

    let tx_a = a
        .get_built_transaction(vec![common::payment("1")], TxOptions { salt: Some(7), ..TxOptions::default() })
        .unwrap();
    let tx_b = b
        .get_built_transaction(vec![common::payment("1")], TxOptions { salt: Some(7), ..TxOptions::default() })
        .unwrap();

    assert_eq!(a.network().unwrap().passphrase(), common::TEST_PASSPHRASE);
    assert_ne!(tx_a.hash().unwrap(), tx_b.hash().unwrap());
}
