//! Data models
//!
//! Shared between order-server and its HTTP clients.
//! Store ids and cancellation reason ids are `i64`; order ids are UUID strings.

pub mod cancellation_reason;
pub mod ledger;
pub mod store;

// Re-exports
pub use cancellation_reason::*;
pub use ledger::*;
pub use store::*;
