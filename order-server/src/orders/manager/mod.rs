//! OrdersManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional, ledger postings included)
//! - Snapshot updates
//! - Event and change broadcasting
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction, re-check
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to snapshots via EventApplier
//!     ├─ 6. Invariant check on every touched snapshot
//!     ├─ 7. Persist events and snapshots
//!     ├─ 8. Mark command processed
//!     ├─ 9. Commit transaction
//!     ├─ 10. Broadcast events and change notifications
//!     └─ 11. Return response
//! ```
//!
//! redb admits one write transaction at a time, so two commands racing for
//! the same order serialize here and the loser sees the winner's state.

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::appliers::EventAction;
use super::ledger::{self, LedgerAccountant};
use super::reasons::ReasonCatalog;
use super::storage::{OrderStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
use crate::core::EngineConfig;
use crate::geo;
use shared::models::{BalanceCheck, CancellationReason, Store, StoreLedgerEntry, StoreUpsert};
use shared::money::Money;
use shared::order::{
    Actor, ActorRole, CommandResponse, OrderChangeEvent, OrderCommand, OrderEvent, OrderSnapshot,
};
use std::path::Path;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// Change notification channel capacity
const CHANGE_CHANNEL_CAPACITY: usize = 4096;

/// Outcome of a committed command, before broadcasting
struct Processed {
    response: CommandResponse,
    events: Vec<OrderEvent>,
    changes: Vec<OrderChangeEvent>,
}

/// OrdersManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Subscribers use it to detect restarts.
pub struct OrdersManager {
    storage: OrderStorage,
    config: EngineConfig,
    event_tx: broadcast::Sender<OrderEvent>,
    change_tx: broadcast::Sender<OrderChangeEvent>,
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("config", &self.config)
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    /// Create a new OrdersManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, config: EngineConfig) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        let manager = Self::from_parts(storage, config);
        tracing::info!(epoch = %manager.epoch, "OrdersManager started with new epoch");
        Ok(manager)
    }

    /// Create an OrdersManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: OrderStorage, config: EngineConfig) -> Self {
        Self::from_parts(storage, config)
    }

    fn from_parts(storage: OrderStorage, config: EngineConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            storage,
            config,
            event_tx,
            change_tx,
            epoch: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to committed order events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to status/payment change notifications
    pub fn subscribe_changes(&self) -> broadcast::Receiver<OrderChangeEvent> {
        self.change_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        let command_name = cmd.payload.name();
        match self.process_command(cmd) {
            Ok(processed) => {
                // Broadcast after successful commit
                for event in processed.events {
                    if self.event_tx.send(event).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                for change in processed.changes {
                    if self.change_tx.send(change).is_err() {
                        tracing::debug!("Change broadcast skipped: no active receivers");
                        break;
                    }
                }
                processed.response
            }
            Err(err) => {
                log_rejection(&command_id, command_name, &err);
                CommandResponse::error(command_id, err.into())
            }
        }
    }

    /// Process command inside one write transaction
    fn process_command(&self, cmd: OrderCommand) -> ManagerResult<Processed> {
        tracing::debug!(command_id = %cmd.command_id, command = cmd.payload.name(), "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::info!(command_id = %cmd.command_id, "Duplicate command");
            return Ok(Processed {
                response: CommandResponse::duplicate(cmd.command_id),
                events: vec![],
                changes: vec![],
            });
        }

        // 2. Begin write transaction; a concurrent replay may have won the race
        let txn = self.storage.begin_write()?;
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            tracing::info!(command_id = %cmd.command_id, "Duplicate command");
            return Ok(Processed {
                response: CommandResponse::duplicate(cmd.command_id),
                events: vec![],
                changes: vec![],
            });
        }

        // 3. Context
        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, &self.config, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: cmd.timestamp,
        };

        // 4. Execute action
        let action = CommandAction::from(&cmd);
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))
            .map_err(ManagerError::from)?;

        // 5. Apply events to snapshots
        let mut changes = Vec::with_capacity(events.len());
        for event in &events {
            let before = ctx.load_snapshot(&event.order_id).ok();
            let old_status = before.as_ref().map(|s| s.status);
            let mut snapshot =
                before.unwrap_or_else(|| OrderSnapshot::new(event.order_id.clone()));

            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);

            changes.push(OrderChangeEvent {
                order_id: snapshot.order_id.clone(),
                old_status,
                new_status: snapshot.status,
                payment_status: snapshot.payment_status,
                sequence: event.sequence,
            });
            ctx.save_snapshot(snapshot);
        }

        // 6. Invariant check
        for snapshot in ctx.modified_snapshots() {
            if !snapshot.totals_consistent() {
                tracing::error!(
                    order_id = %snapshot.order_id,
                    base = %snapshot.base_amount,
                    markup = %snapshot.markup_amount,
                    delivery_fee = %snapshot.delivery_fee,
                    total = %snapshot.total_amount,
                    "Order totals inconsistent, aborting command"
                );
                return Err(ManagerError::Internal(format!(
                    "order {} totals inconsistent",
                    snapshot.order_id
                )));
            }
        }

        // 7. Persist events and snapshots
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }
        for snapshot in ctx.modified_snapshots() {
            self.storage.store_snapshot(&txn, snapshot)?;
        }
        let max_sequence = ctx.current_sequence();
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        // Response carries the state the caller just produced
        let order = match events.first() {
            Some(event) => ctx.load_snapshot(&event.order_id).ok(),
            None => match cmd.target_order_id() {
                Some(order_id) => self.storage.get_snapshot_txn(&txn, order_id)?,
                None => None,
            },
        };
        drop(ctx);

        // 8. Mark command processed
        self.storage
            .mark_command_processed(&txn, &cmd.command_id)?;

        // 9. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            order_id = ?order.as_ref().map(|o| o.order_id.as_str()),
            event_count = events.len(),
            "Command processed successfully"
        );
        Ok(Processed {
            response: CommandResponse::success(cmd.command_id, order),
            events,
            changes,
        })
    }

    // ========== Store registry ==========

    /// Create or update a store's collaborator-owned fields
    ///
    /// The cached ledger balance is never taken from the caller.
    pub fn upsert_store(&self, store_id: i64, upsert: StoreUpsert) -> ManagerResult<Store> {
        geo::check_point(&upsert.location)
            .map_err(|e| ManagerError::InvalidInput(e.to_string()))?;
        let radius = upsert
            .service_radius_m
            .unwrap_or(self.config.default_service_radius_m);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ManagerError::InvalidInput(format!(
                "service radius must be positive, got {radius}"
            )));
        }
        if upsert.owner_id.trim().is_empty() {
            return Err(ManagerError::InvalidInput(
                "owner_id must not be empty".to_string(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let now = shared::util::now_millis();
        let existing = self.storage.get_store_txn(&txn, store_id)?;
        let store = Store {
            store_id,
            name: upsert.name,
            owner_id: upsert.owner_id,
            is_verified: upsert.is_verified,
            is_open: upsert.is_open,
            location: upsert.location,
            service_radius_m: radius,
            ledger_balance: existing
                .as_ref()
                .map(|s| s.ledger_balance)
                .unwrap_or(Money::ZERO),
            created_at: existing.as_ref().map(|s| s.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.storage.put_store(&txn, &store)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            store_id,
            is_verified = store.is_verified,
            is_open = store.is_open,
            service_radius_m = store.service_radius_m,
            created = existing.is_none(),
            "Store upserted"
        );
        Ok(store)
    }

    pub fn get_store(&self, store_id: i64) -> ManagerResult<Option<Store>> {
        Ok(self.storage.get_store(store_id)?)
    }

    // ========== Ledger ==========

    /// Entries with `created_at` in `[from_ms, to_ms)`, ordered by entry id
    pub fn list_ledger_entries(
        &self,
        store_id: i64,
        from_ms: i64,
        to_ms: i64,
    ) -> ManagerResult<Vec<StoreLedgerEntry>> {
        Ok(self.storage.list_ledger_entries(store_id, from_ms, to_ms)?)
    }

    /// Pay a store out of its balance
    pub fn record_payout(
        &self,
        actor: &Actor,
        store_id: i64,
        amount: Money,
        note: Option<String>,
    ) -> ManagerResult<StoreLedgerEntry> {
        require_system(actor, "record_payout")?;
        let txn = self.storage.begin_write()?;
        let entry = LedgerAccountant::new(&self.storage, &self.config)
            .record_payout(&txn, store_id, amount, note)
            .inspect_err(|e| {
                tracing::error!(store_id, amount = %amount, error = %e, "Payout rejected")
            })?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(store_id, entry_id = entry.entry_id, amount = %amount, "Payout recorded");
        Ok(entry)
    }

    /// Post a correcting entry
    pub fn post_adjustment(
        &self,
        actor: &Actor,
        store_id: i64,
        order_id: Option<String>,
        amount: Money,
        note: &str,
    ) -> ManagerResult<StoreLedgerEntry> {
        require_system(actor, "post_adjustment")?;
        let txn = self.storage.begin_write()?;
        let entry = LedgerAccountant::new(&self.storage, &self.config)
            .post_adjustment(&txn, store_id, order_id, amount, note)
            .inspect_err(|e| {
                tracing::error!(store_id, amount = %amount, error = %e, "Adjustment rejected")
            })?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(store_id, entry_id = entry.entry_id, amount = %amount, "Adjustment posted");
        Ok(entry)
    }

    pub fn verify_store_balance(&self, store_id: i64) -> ManagerResult<BalanceCheck> {
        Ok(ledger::verify_store_balance(&self.storage, store_id)?)
    }

    // ========== Cancellation reasons ==========

    pub fn register_cancellation_reason(&self, text: &str) -> ManagerResult<CancellationReason> {
        Ok(ReasonCatalog::new(&self.storage).register(text)?)
    }

    pub fn list_cancellation_reasons(&self) -> ManagerResult<Vec<CancellationReason>> {
        Ok(ReasonCatalog::new(&self.storage).list()?)
    }

    pub fn deactivate_cancellation_reason(
        &self,
        reason_id: i64,
    ) -> ManagerResult<CancellationReason> {
        Ok(ReasonCatalog::new(&self.storage).deactivate(reason_id)?)
    }

    // ========== Public Query Methods ==========

    /// Get a snapshot by order ID
    pub fn get_order(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.get_snapshot(order_id)?)
    }

    /// Order that a gateway reference was issued for
    pub fn find_order_by_payment_reference(
        &self,
        reference: &str,
    ) -> ManagerResult<Option<String>> {
        Ok(self.storage.find_order_by_payment_reference(reference)?)
    }

    /// Get current sequence number
    pub fn get_current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Get all events for a specific order
    pub fn get_events_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// Rebuild a snapshot from events (for verification)
    ///
    /// Uses EventApplier to apply each event to build the snapshot.
    pub fn rebuild_snapshot(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        if events.is_empty() {
            return Err(ManagerError::OrderNotFound(order_id.to_string()));
        }

        let mut snapshot = OrderSnapshot::new(order_id.to_string());
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }

        Ok(snapshot)
    }

    /// Compare the stored snapshot with a replay of its events
    pub fn verify_snapshot(&self, order_id: &str) -> ManagerResult<bool> {
        let stored = self
            .storage
            .get_snapshot(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        let rebuilt = self.rebuild_snapshot(order_id)?;

        let consistent = stored.state_checksum == rebuilt.state_checksum;
        if !consistent {
            tracing::error!(
                order_id,
                stored_checksum = %stored.state_checksum,
                rebuilt_checksum = %rebuilt.state_checksum,
                "Snapshot drift detected"
            );
        }
        Ok(consistent)
    }
}

// Make OrdersManager Clone-able; storage and channels are shared
impl Clone for OrdersManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            change_tx: self.change_tx.clone(),
            epoch: self.epoch.clone(),
        }
    }
}

fn require_system(actor: &Actor, operation: &str) -> ManagerResult<()> {
    if actor.role == ActorRole::System {
        return Ok(());
    }
    let role = actor.role.to_string();
    crate::security_log!(
        "WARN",
        "ledger_operation_denied",
        actor_id = actor.id.as_str(),
        role = role.as_str(),
        operation = operation
    );
    Err(ManagerError::Unauthorized(format!(
        "{operation} requires the system actor"
    )))
}

/// Rejections are expected traffic; only policy and payment failures are
/// security-relevant, and ledger failures need manual follow-up.
fn log_rejection(command_id: &str, command: &str, err: &ManagerError) {
    match err {
        ManagerError::Rejected(OrderError::Unauthorized(reason)) => {
            let reason = reason.to_string();
            crate::security_log!(
                "WARN",
                "command_denied",
                command_id = command_id,
                command = command,
                reason = reason.as_str()
            );
        }
        ManagerError::Rejected(OrderError::Reconciliation(e)) => {
            let error = e.to_string();
            crate::security_log!(
                "WARN",
                "payment_reconciliation_rejected",
                command_id = command_id,
                error = error.as_str()
            );
        }
        ManagerError::Rejected(OrderError::Ledger(e)) | ManagerError::Ledger(e) => {
            tracing::error!(command_id, command, error = %e, "Ledger posting failed");
        }
        ManagerError::Storage(_) | ManagerError::Internal(_) => {
            tracing::error!(command_id, command, error = %err, "Command failed");
        }
        _ => {
            tracing::info!(command_id, command, error = %err, "Command rejected");
        }
    }
}

#[cfg(test)]
mod tests;
