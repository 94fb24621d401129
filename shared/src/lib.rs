//! Shared types for the delivery order platform
//!
//! Money, order commands/events/snapshots, store and ledger models, and the
//! unified error codes used by the order server and its HTTP clients.

pub mod error;
pub mod models;
pub mod money;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use money::Money;
pub use serde::{Deserialize, Serialize};
