//! Order Event Sourcing Module
//!
//! This module implements the order lifecycle and store ledger using
//! event sourcing:
//!
//! - **manager**: Core OrdersManager for command processing and event generation
//! - **storage**: redb-based persistence for events, snapshots, stores and ledger
//! - **state_machine**: Transition graph and the shared transition guard
//! - **ledger**: Postings and balance recomputation
//! - **reasons**: Cancellation reason catalog
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → Action → Event → Storage (redb)
//!                 ↓                    ↓          ↓
//!              Broadcast          Applier    Ledger entries
//!                 ↓
//!           All Subscribers
//! ```
//!
//! # Data Flow
//!
//! 1. Caller sends an OrderCommand (HTTP handler or payment reconciler)
//! 2. OrdersManager opens the single redb write transaction
//! 3. The action checks state, authorization and business rules
//! 4. Ledger entries are posted inside the same transaction
//! 5. OrderEvent is generated with a global sequence and applied to the snapshot
//! 6. Everything commits together, then events are broadcast
//! 7. CommandResponse is returned to the caller

pub mod actions;
pub mod appliers;
pub mod ledger;
pub mod manager;
pub mod reasons;
pub mod state_machine;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-exports
pub use ledger::{LedgerAccountant, LedgerError};
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use reasons::{ReasonCatalog, ReasonError};
pub use storage::{OrderStorage, StorageError};
pub use traits::OrderError;

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, OrderChangeEvent,
    OrderCommand, OrderCommandPayload, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
};
