//! Network identity: details reported by the server root and the binding
//! derived from the network passphrase.

use alloy::primitives::{hex, B256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Network details published at the API root (`GET /`).
///
/// Deserialized from the camelCased root document; unknown fields are kept
/// in `extra` so nothing the server reports is lost.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetails {
    /// Passphrase identifying the network; transactions are bound to it.
    pub network_passphrase: String,

    /// Server clock at the time the document was produced (unix seconds).
    #[serde(default)]
    pub current_time: Option<i64>,

    /// Master account of the network, if reported.
    #[serde(default)]
    pub master_account_id: Option<String>,

    /// Everything else the root document carries.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The network a context signs transactions for.
///
/// The network id is the SHA-256 of the passphrase and prefixes every
/// transaction hash, so a signature is only valid on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBinding {
    passphrase: String,
    network_id: B256,
}

impl NetworkBinding {
    /// Derive the binding from a network passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let network_id = B256::from_slice(&Sha256::digest(passphrase.as_bytes()));
        Self {
            passphrase: passphrase.to_string(),
            network_id,
        }
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn network_id(&self) -> B256 {
        self.network_id
    }

    /// Hex form of the network id, as embedded into envelopes.
    pub fn network_id_hex(&self) -> String {
        hex::encode(self.network_id)
    }
}
