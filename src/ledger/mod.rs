//! Ledger primitives: wallets, network binding and transaction envelopes.
//!
//! # Data Flow
//! ```text
//! Operations + source account
//!     → builder.rs (salt, time bounds, ordering)
//!     → transaction.rs (network-bound hash, signatures)
//!     → envelope string (base64) handed to the submission path
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from explicit input or environment variables
//! - Never log private keys or signatures
//! - The network binding is carried by value, never looked up globally

pub mod builder;
pub mod network;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use builder::{TransactionBuilder, TxOptions};
pub use network::{NetworkBinding, NetworkDetails};
pub use transaction::Transaction;
pub use types::{LedgerError, LedgerResult, Operation, TimeBounds};
pub use wallet::{Keypair, Wallet, WalletCapability};
