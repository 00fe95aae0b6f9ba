//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! CallOptions (api::caller)
//!     → request.rs (descriptor, query flattening, content headers)
//!     → signature.rs (optional signature headers)
//!     → executor.rs (one network attempt)
//!     → jsonapi.rs / case.rs (response shaping)
//! ```
//!
//! # Design Decisions
//! - Everything here is independent of wallets and identity state; the
//!   caller passes in exactly what each step needs
//! - The executor is the only piece that touches the network

pub mod case;
pub mod executor;
pub mod jsonapi;
pub mod request;
pub mod signature;

pub use executor::{HttpExecutor, RawResponse, ReqwestExecutor, TransportFailure};
pub use request::{Method, RequestDescriptor};
