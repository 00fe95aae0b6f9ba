//! Ledger-side types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while encoding, signing or decoding transactions locally.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction could not be serialized or hashed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Envelope string is not a valid transaction envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A transaction must carry at least one operation.
    #[error("Transaction has no operations")]
    NoOperations,
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A single ledger operation.
///
/// The operation body is opaque to this crate: it is produced by whatever
/// operation builder the caller uses and carried into the envelope verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation type tag (e.g. `"payment"`, `"create_balance"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional per-operation source account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Operation-specific payload.
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Operation {
    /// Create an operation sourced from the transaction account.
    pub fn new(kind: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            source: None,
            body,
        }
    }

    /// Override the source account for this operation only.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unix time window in which a transaction is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_serializes_type_tag() {
        let op = Operation::new("payment", json!({"amount": "10"}));
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "payment");
        assert!(value.get("source").is_none());

        let op = op.with_source("GABC");
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["source"], "GABC");
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Wallet("bad key".into());
        assert_eq!(err.to_string(), "Wallet error: bad key");
        assert_eq!(LedgerError::NoOperations.to_string(), "Transaction has no operations");
    }
}
