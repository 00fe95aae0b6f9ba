//! Transaction assembly and signing.
//!
//! # Responsibilities
//! - Collect operations under a source account
//! - Fill in salt and time bounds (from a skew-corrected clock)
//! - Bind to a network and sign with every registered keypair

use crate::ledger::network::NetworkBinding;
use crate::ledger::transaction::{Transaction, TransactionBody};
use crate::ledger::types::{LedgerError, LedgerResult, Operation, TimeBounds};
use crate::ledger::wallet::Keypair;

/// Default validity window of a built transaction.
pub const DEFAULT_TX_LIFETIME_SECS: u64 = 7 * 24 * 3600;

/// Optional knobs for transaction assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxOptions {
    /// Fixed salt; random when unset.
    pub salt: Option<u64>,
    /// Explicit validity window; `[0, now + DEFAULT_TX_LIFETIME_SECS]` when unset.
    pub time_bounds: Option<TimeBounds>,
    pub memo: Option<String>,
}

/// Builder for network-bound, signed transactions.
#[derive(Debug)]
pub struct TransactionBuilder {
    source: String,
    options: TxOptions,
    operations: Vec<Operation>,
    signers: Vec<Keypair>,
    now: Option<i64>,
}

impl TransactionBuilder {
    /// Start a transaction sourced from `source` account.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            options: TxOptions::default(),
            operations: Vec::new(),
            signers: Vec::new(),
            now: None,
        }
    }

    pub fn with_options(mut self, options: TxOptions) -> Self {
        self.options = options;
        self
    }

    /// Use this unix time instead of the local clock when computing bounds.
    pub fn at_time(mut self, now: i64) -> Self {
        self.now = Some(now);
        self
    }

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn add_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    pub fn add_signer(mut self, keypair: Keypair) -> Self {
        self.signers.push(keypair);
        self
    }

    /// Assemble the body, bind it to `network` and apply all signatures.
    pub fn build(self, network: &NetworkBinding) -> LedgerResult<Transaction> {
        if self.operations.is_empty() {
            return Err(LedgerError::NoOperations);
        }

        let now = self
            .now
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
            .max(0) as u64;
        let time_bounds = self.options.time_bounds.unwrap_or(TimeBounds {
            min_time: 0,
            max_time: now.saturating_add(DEFAULT_TX_LIFETIME_SECS),
        });

        let body = TransactionBody {
            source: self.source,
            salt: self.options.salt.unwrap_or_else(|| fastrand::u64(..)),
            time_bounds,
            memo: self.options.memo,
            operations: self.operations,
        };

        let mut tx = Transaction::new(body, network);
        for keypair in &self.signers {
            tx.sign(keypair)?;
        }

        tracing::debug!(
            source = %tx.source(),
            operations = tx.operations().len(),
            signatures = tx.signatures().len(),
            "Transaction built"
        );

        Ok(tx)
    }
}
