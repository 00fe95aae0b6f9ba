//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::submit::DEFAULT_TRANSACTIONS_ENDPOINT;
use crate::ledger::wallet::PRIVATE_KEY_ENV_VAR;

/// Root configuration for the ledger client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// API server settings.
    pub api: ApiConfig,

    /// Network binding settings.
    pub network: NetworkConfig,

    /// Transaction submission defaults.
    pub submission: SubmissionConfig,

    /// Wallet settings.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://api.ledger.example".
    pub base_url: String,

    /// Timeout for regular calls, in seconds.
    pub timeout_secs: u64,

    /// Seconds added to the local clock when signing.
    pub clock_skew_secs: i64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
            clock_skew_secs: 0,
        }
    }
}

/// Network binding settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetworkConfig {
    /// Fixed passphrase; discovered from the root document when unset.
    pub passphrase: Option<String>,
}

/// Transaction submission defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub endpoint: String,
    pub wait_for_ingest: bool,
    pub sign_request: bool,
    pub json_api: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TRANSACTIONS_ENDPOINT.to_string(),
            wait_for_ingest: true,
            sign_request: false,
            json_api: false,
        }
    }
}

/// Wallet settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Account the key signs for; the key's own address when unset.
    pub account_id: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: PRIVATE_KEY_ENV_VAR.to_string(),
            account_id: None,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
