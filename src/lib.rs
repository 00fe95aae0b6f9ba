//! Client library for an authenticated ledger API.
//!
//! Issues signed or unsigned JSON:API calls, follows response links, and
//! builds, signs and submits ledger transactions.

pub mod api;
pub mod config;
pub mod http;
pub mod ledger;
pub mod observability;

pub use api::{ApiCaller, ApiError, ApiResponse, ApiResult, CallOptions, IdentityContext, SubmissionParams};
pub use config::schema::ClientConfig;
pub use ledger::{Operation, Transaction, TxOptions, Wallet};
