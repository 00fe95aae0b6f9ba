//! Transactions and their serialized envelope form.
//!
//! # Envelope Format
//! ```text
//! base64( json { "tx": TransactionBody, "signatures": [DecoratedSignature] } )
//! ```
//!
//! The hash that gets signed is `sha256(network_id || "tx" || json(TransactionBody))`,
//! so the same body signed for two networks yields two unrelated signatures.

use alloy::primitives::{hex, B256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::network::NetworkBinding;
use crate::ledger::types::{LedgerError, LedgerResult, Operation, TimeBounds};
use crate::ledger::wallet::Keypair;

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub source: String,
    pub salt: u64,
    pub time_bounds: TimeBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub operations: Vec<Operation>,
}

/// A signature tagged with the last bytes of the signer's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    /// Hex-encoded signer hint.
    pub hint: String,
    /// Base64-encoded 65-byte signature.
    pub signature: String,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    tx: TransactionBody,
    #[serde(default)]
    signatures: Vec<DecoratedSignature>,
}

/// A transaction bound to a network, signed or not yet signed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    body: TransactionBody,
    network_id: B256,
    signatures: Vec<DecoratedSignature>,
}

impl Transaction {
    /// Bind an unsigned body to a network.
    pub fn new(body: TransactionBody, network: &NetworkBinding) -> Self {
        Self {
            body,
            network_id: network.network_id(),
            signatures: Vec::new(),
        }
    }

    /// Decode an envelope produced by [`Transaction::to_envelope`].
    pub fn from_envelope(envelope: &str, network: &NetworkBinding) -> LedgerResult<Self> {
        let raw = STANDARD
            .decode(envelope.trim())
            .map_err(|e| LedgerError::MalformedEnvelope(format!("invalid base64: {}", e)))?;
        let decoded: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| LedgerError::MalformedEnvelope(e.to_string()))?;

        Ok(Self {
            body: decoded.tx,
            network_id: network.network_id(),
            signatures: decoded.signatures,
        })
    }

    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn source(&self) -> &str {
        &self.body.source
    }

    pub fn operations(&self) -> &[Operation] {
        &self.body.operations
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    /// Network-bound hash of the body.
    pub fn hash(&self) -> LedgerResult<B256> {
        let body = serde_json::to_vec(&self.body)
            .map_err(|e| LedgerError::Encoding(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(self.network_id.as_slice());
        hasher.update(b"tx");
        hasher.update(&body);
        Ok(B256::from_slice(&hasher.finalize()))
    }

    /// Add a signature from `keypair`.
    pub fn sign(&mut self, keypair: &Keypair) -> LedgerResult<()> {
        let hash = self.hash()?;
        let signature = keypair.sign_digest(&hash)?;

        self.signatures.push(DecoratedSignature {
            hint: hex::encode(keypair.hint()),
            signature: STANDARD.encode(signature.as_bytes()),
        });
        Ok(())
    }

    /// Serialize into the opaque envelope string submitted to the API.
    pub fn to_envelope(&self) -> LedgerResult<String> {
        let envelope = Envelope {
            tx: self.body.clone(),
            signatures: self.signatures.clone(),
        };
        let raw = serde_json::to_vec(&envelope).map_err(|e| LedgerError::Encoding(e.to_string()))?;
        Ok(STANDARD.encode(raw))
    }
}
