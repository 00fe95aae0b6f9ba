//! Wallet management and signing keys.
//!
//! # Security
//! - Private keys are loaded ONLY from explicit strings or environment variables
//! - Keys are never logged or serialized
//! - `Debug` output exposes the public identity only

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use sha2::{Digest, Sha256};

use crate::ledger::types::{LedgerError, LedgerResult};

/// Default environment variable name for the wallet private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_WALLET_PRIVATE_KEY";

/// Signing keypair backed by a secp256k1 private key.
#[derive(Clone)]
pub struct Keypair {
    signer: PrivateKeySigner,
}

impl Keypair {
    /// Parse a hex-encoded private key (with or without `0x` prefix).
    pub fn from_private_key(private_key_hex: &str) -> LedgerResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| LedgerError::Wallet(format!("Invalid private key format: {}", e)))?;

        Ok(Self { signer })
    }

    /// Address derived from the public key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Public identifier used as `keyId` in request signatures.
    pub fn public_id(&self) -> String {
        self.address().to_string()
    }

    /// Last four bytes of the address, used to decorate signatures.
    pub fn hint(&self) -> [u8; 4] {
        let address = self.address();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&address.as_slice()[16..]);
        hint
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &B256) -> LedgerResult<Signature> {
        self.signer
            .sign_hash_sync(digest)
            .map_err(|e| LedgerError::Wallet(format!("Signing failed: {}", e)))
    }

    /// SHA-256 the payload and sign the digest.
    pub fn sign(&self, payload: &[u8]) -> LedgerResult<Signature> {
        let digest = B256::from_slice(&Sha256::digest(payload));
        self.sign_digest(&digest)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Capability set every wallet must expose to sign requests and transactions.
///
/// A wallet is accepted by an identity context only when it exposes both a
/// keypair and a non-empty account identifier.
pub trait WalletCapability: Send + Sync + std::fmt::Debug {
    /// Signing keypair, if the wallet holds one.
    fn keypair(&self) -> Option<&Keypair>;

    /// Stable account identifier on the ledger.
    fn account_id(&self) -> &str;
}

/// Default wallet: a keypair plus the ledger account it signs for.
#[derive(Debug, Clone)]
pub struct Wallet {
    keypair: Option<Keypair>,
    account_id: String,
}

impl Wallet {
    /// Create a wallet whose account id is the keypair's own address.
    pub fn from_private_key(private_key_hex: &str) -> LedgerResult<Self> {
        let keypair = Keypair::from_private_key(private_key_hex)?;
        let account_id = keypair.public_id();

        tracing::info!(account_id = %account_id, "Wallet initialized");

        Ok(Self {
            keypair: Some(keypair),
            account_id,
        })
    }

    /// Load the private key from the named environment variable.
    pub fn from_env(var: &str) -> LedgerResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            LedgerError::Wallet(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key)
    }

    /// A wallet that knows its account but holds no key.
    ///
    /// Such a wallet is rejected wherever signing is possible.
    pub fn view_only(account_id: impl Into<String>) -> Self {
        Self {
            keypair: None,
            account_id: account_id.into(),
        }
    }

    /// Sign on behalf of a different account (e.g. a signer added to it).
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }
}

impl WalletCapability for Wallet {
    fn keypair(&self) -> Option<&Keypair> {
        self.keypair.as_ref()
    }

    fn account_id(&self) -> &str {
        &self.account_id
    }
}
