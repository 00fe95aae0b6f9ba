//! Authenticated ledger API client.
//!
//! # Data Flow
//! ```text
//! IdentityContext (base URL, wallet, network binding)
//!     → ApiCaller::call (caller.rs)
//!     → ApiResponse + BoundLinks (response.rs) | ApiError (error.rs)
//!
//! operations → ApiCaller::get_transaction → envelope
//!     → ApiCaller::post_tx_envelope (submit.rs)
//! ```

pub mod caller;
pub mod context;
pub mod error;
pub mod response;
pub mod submit;

pub use caller::{ApiCaller, CallOptions};
pub use context::{IdentityContext, IdentityOptions};
pub use error::{ApiError, ApiResult, ErrorKind, HttpErrorClass, NormalizedError};
pub use response::{ApiResponse, BoundLink};
pub use submit::{SubmissionParams, DEFAULT_TRANSACTIONS_ENDPOINT, SUBMIT_TRANSACTION_TIMEOUT};
