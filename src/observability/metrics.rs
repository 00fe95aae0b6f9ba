//! Metrics collection.
//!
//! # Metrics
//! - `ledger_api_requests_total` (counter): calls by method, outcome
//! - `ledger_api_request_duration_seconds` (histogram): call latency by method
//! - `ledger_api_submissions_total` (counter): envelope posts by outcome
//! - `ledger_api_submission_duration_seconds` (histogram): submission latency
//!
//! Outcomes are the HTTP status for answered calls, otherwise a failure label
//! (`no_response`, `decode_error`, or an error kind for submissions).
//! Nothing is exported unless the host application installs a recorder.

use std::time::Instant;

/// Record one pipeline call.
pub fn record_call(method: &str, outcome: &str, start_time: Instant) {
    let duration = start_time.elapsed().as_secs_f64();

    metrics::counter!(
        "ledger_api_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!("ledger_api_request_duration_seconds", "method" => method.to_string())
        .record(duration);
}

/// Record one envelope submission.
pub fn record_submission(outcome: &str, start_time: Instant) {
    let duration = start_time.elapsed().as_secs_f64();

    metrics::counter!("ledger_api_submissions_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("ledger_api_submission_duration_seconds").record(duration);
}
