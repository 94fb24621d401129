//! Core traits for the action/applier architecture
//!
//! - [`CommandHandler`]: validates a command against current state and
//!   produces events. Runs inside the write transaction.
//! - [`EventApplier`]: folds one event into a snapshot. Pure.
//!
//! [`CommandContext`] is the only window an action has onto storage: it
//! caches snapshots for the duration of the transaction and hands out
//! event sequence numbers.

use async_trait::async_trait;
use redb::WriteTransaction;
use shared::models::Store;
use shared::money::Money;
use shared::order::{Actor, OrderEvent, OrderSnapshot, OrderStatus};
use std::collections::HashMap;
use thiserror::Error;

pub use super::appliers::EventApplier;
use super::ledger::LedgerError;
use super::storage::{OrderStorage, StorageError};
use crate::auth::DenyReason;
use crate::core::EngineConfig;
use crate::geo::GeofenceError;
use crate::payment::ReconciliationError;

/// Errors raised by actions
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order {order_id} is already {status}")]
    AlreadyTerminal {
        order_id: String,
        status: OrderStatus,
    },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Unauthorized: {0}")]
    Unauthorized(DenyReason),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Geofence(#[from] GeofenceError),

    #[error("Store not found: {0}")]
    StoreNotFound(i64),

    #[error("Store {0} is not accepting orders")]
    StoreUnavailable(i64),

    #[error("Invalid cancellation reason: {0}")]
    InvalidCancellationReason(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Command metadata carried alongside every action
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: Actor,
    /// Client timestamp, if the caller sent one
    pub timestamp: Option<i64>,
}

/// Per-command view of the write transaction
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    config: &'a EngineConfig,
    snapshots: HashMap<String, OrderSnapshot>,
    current_sequence: u64,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a OrderStorage,
        config: &'a EngineConfig,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            config,
            snapshots: HashMap::new(),
            current_sequence,
        }
    }

    /// Load a snapshot, preferring the copy already modified in this command
    pub fn load_snapshot(&mut self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.snapshots.values()
    }

    /// Load a store inside the transaction
    pub fn load_store(&self, store_id: i64) -> Result<Store, OrderError> {
        self.storage
            .get_store_txn(self.txn, store_id)?
            .ok_or(OrderError::StoreNotFound(store_id))
    }

    /// Allocate the next global event sequence
    pub fn next_sequence(&mut self) -> u64 {
        self.current_sequence += 1;
        self.current_sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    pub fn txn(&self) -> &'a WriteTransaction {
        self.txn
    }

    pub fn storage(&self) -> &'a OrderStorage {
        self.storage
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }
}

/// Command handler - one implementation per command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}


/// Sum of line amounts, `None` on overflow
pub(crate) fn sum_amounts(amounts: impl IntoIterator<Item = Option<Money>>) -> Option<Money> {
    amounts
        .into_iter()
        .try_fold(Money::ZERO, |acc, m| acc.checked_add(m?))
}
