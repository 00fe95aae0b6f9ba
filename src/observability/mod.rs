//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! api::caller / api::submit produce:
//!     → tracing events (request_id, method, path, status)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (CLI, or the host application's own)
//!     → whatever metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing subscribers and recorders is left
//!   to binaries
//! - Request ID flows from the descriptor into every event for a call

pub mod logging;
pub mod metrics;
