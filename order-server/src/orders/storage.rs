//! redb-based storage layer for the order engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `snapshots` | `order_id` | `OrderSnapshot` | Snapshot cache |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `sequence_counter` | `"seq"` / `"ledger_seq"` | `u64` | Global event and ledger sequences |
//! | `stores` | `store_id` | `Store` | Store registry + cached balance |
//! | `ledger_entries` | `(store_id, entry_id)` | `StoreLedgerEntry` | Store ledger (append-only) |
//! | `order_postings` | `(order_id, kind)` | `entry_id` | One posting per order and kind |
//! | `cancellation_reasons` | `reason_id` | `CancellationReason` | Reason catalog |
//! | `reason_texts` | normalized text | `reason_id` | Case-insensitive uniqueness |
//! | `payment_refs` | gateway reference | `order_id` | Callback routing |
//!
//! Every mutating command runs inside a single write transaction. redb allows
//! one writer at a time, so conflicting commands serialize and the loser sees
//! the winner's committed state.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{
    CancellationReason, LedgerEntryKind, SYSTEM_REASON_ID, SYSTEM_REASON_TEXT, Store,
    StoreLedgerEntry,
};
use shared::money::Money;
use shared::order::{OrderEvent, OrderSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for storing events: key = (order_id, sequence), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Table for storing snapshots: key = order_id, value = JSON-serialized OrderSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Table for tracking processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Table for sequence counters
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

/// Table for stores: key = store_id, value = JSON-serialized Store
const STORES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("stores");

/// Table for ledger entries: key = (store_id, entry_id), value = JSON-serialized StoreLedgerEntry
const LEDGER_TABLE: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("ledger_entries");

/// Table guarding duplicate postings: key = (order_id, kind), value = entry_id
const ORDER_POSTINGS_TABLE: TableDefinition<(&str, &str), u64> =
    TableDefinition::new("order_postings");

/// Table for cancellation reasons: key = reason_id, value = JSON-serialized CancellationReason
const REASONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("cancellation_reasons");

/// Index for reason uniqueness: key = normalized text, value = reason_id
const REASON_TEXTS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("reason_texts");

/// Index for gateway callbacks: key = payment reference, value = order_id
const PAYMENT_REFS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("payment_refs");

const SEQUENCE_KEY: &str = "seq";
const LEDGER_SEQUENCE_KEY: &str = "ledger_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Ledger sum overflow for store {0}")]
    BalanceOverflow(i64),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with
    /// an atomic root swap), so a crash never leaves a half-posted ledger.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    /// Create all tables, seed counters and the system cancellation reason
    fn initialize(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(STORES_TABLE)?;
            let _ = write_txn.open_table(LEDGER_TABLE)?;
            let _ = write_txn.open_table(ORDER_POSTINGS_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_REFS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            for key in [SEQUENCE_KEY, LEDGER_SEQUENCE_KEY] {
                if seq_table.get(key)?.is_none() {
                    seq_table.insert(key, 0u64)?;
                }
            }
        }
        let storage = Self { db: Arc::new(db) };
        if storage.get_reason_txn(&write_txn, SYSTEM_REASON_ID)?.is_none() {
            let system_reason = CancellationReason {
                id: SYSTEM_REASON_ID,
                reason_text: SYSTEM_REASON_TEXT.to_string(),
                is_active: true,
                created_at: shared::util::now_millis(),
            };
            storage.put_reason(&write_txn, &system_reason)?;
        }
        write_txn.commit()?;

        Ok(storage)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current event sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current event sequence (within transaction)
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set event sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    /// Increment and return the ledger entry sequence
    pub fn next_ledger_entry_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(LEDGER_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(LEDGER_SEQUENCE_KEY, next)?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for an order, ordered by sequence
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a snapshot by order ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Payment References ==========

    pub fn index_payment_reference(
        &self,
        txn: &WriteTransaction,
        reference: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENT_REFS_TABLE)?;
        table.insert(reference, order_id)?;
        Ok(())
    }

    pub fn find_order_by_payment_reference_txn(
        &self,
        txn: &WriteTransaction,
        reference: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(PAYMENT_REFS_TABLE)?;
        Ok(table.get(reference)?.map(|guard| guard.value().to_string()))
    }

    pub fn find_order_by_payment_reference(&self, reference: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_REFS_TABLE)?;
        Ok(table.get(reference)?.map(|guard| guard.value().to_string()))
    }

    // ========== Stores ==========

    /// Insert or replace a store record
    pub fn put_store(&self, txn: &WriteTransaction, store: &Store) -> StorageResult<()> {
        let mut table = txn.open_table(STORES_TABLE)?;
        let value = serde_json::to_vec(store)?;
        table.insert(store.store_id, value.as_slice())?;
        Ok(())
    }

    pub fn get_store(&self, store_id: i64) -> StorageResult<Option<Store>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORES_TABLE)?;

        match table.get(store_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_store_txn(
        &self,
        txn: &WriteTransaction,
        store_id: i64,
    ) -> StorageResult<Option<Store>> {
        let table = txn.open_table(STORES_TABLE)?;

        match table.get(store_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Ledger ==========

    /// Append a ledger entry (never overwritten)
    pub fn append_ledger_entry(
        &self,
        txn: &WriteTransaction,
        entry: &StoreLedgerEntry,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LEDGER_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert((entry.store_id, entry.entry_id), value.as_slice())?;
        Ok(())
    }

    /// Sum of every entry of a store (within transaction)
    pub fn sum_ledger_entries_txn(
        &self,
        txn: &WriteTransaction,
        store_id: i64,
    ) -> StorageResult<Money> {
        let table = txn.open_table(LEDGER_TABLE)?;
        let mut amounts = Vec::new();
        for result in table.range((store_id, 0u64)..=(store_id, u64::MAX))? {
            let (_key, value) = result?;
            let entry: StoreLedgerEntry = serde_json::from_slice(value.value())?;
            amounts.push(entry.amount);
        }
        Money::checked_sum(amounts).ok_or(StorageError::BalanceOverflow(store_id))
    }

    /// Sum of every entry of a store (read-only)
    pub fn sum_ledger_entries(&self, store_id: i64) -> StorageResult<Money> {
        let entries = self.list_ledger_entries(store_id, i64::MIN, i64::MAX)?;
        Money::checked_sum(entries.into_iter().map(|e| e.amount))
            .ok_or(StorageError::BalanceOverflow(store_id))
    }

    /// Entries of a store with `from <= created_at < to`, ordered by entry_id
    pub fn list_ledger_entries(
        &self,
        store_id: i64,
        from: i64,
        to: i64,
    ) -> StorageResult<Vec<StoreLedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEDGER_TABLE)?;

        let mut entries = Vec::new();
        for result in table.range((store_id, 0u64)..=(store_id, u64::MAX))? {
            let (_key, value) = result?;
            let entry: StoreLedgerEntry = serde_json::from_slice(value.value())?;
            if entry.created_at >= from && entry.created_at < to {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Whether an order already has a posting of this kind
    pub fn is_posted_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        kind: LedgerEntryKind,
    ) -> StorageResult<bool> {
        let table = txn.open_table(ORDER_POSTINGS_TABLE)?;
        Ok(table.get((order_id, kind.as_str()))?.is_some())
    }

    pub fn mark_posted(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        kind: LedgerEntryKind,
        entry_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_POSTINGS_TABLE)?;
        table.insert((order_id, kind.as_str()), entry_id)?;
        Ok(())
    }

    // ========== Cancellation Reasons ==========

    /// Insert or replace a reason and its uniqueness index entry
    pub fn put_reason(
        &self,
        txn: &WriteTransaction,
        reason: &CancellationReason,
    ) -> StorageResult<()> {
        {
            let mut table = txn.open_table(REASONS_TABLE)?;
            let value = serde_json::to_vec(reason)?;
            table.insert(reason.id, value.as_slice())?;
        }
        let mut index = txn.open_table(REASON_TEXTS_TABLE)?;
        let key = CancellationReason::normalize(&reason.reason_text);
        index.insert(key.as_str(), reason.id)?;
        Ok(())
    }

    pub fn get_reason_txn(
        &self,
        txn: &WriteTransaction,
        reason_id: i64,
    ) -> StorageResult<Option<CancellationReason>> {
        let table = txn.open_table(REASONS_TABLE)?;

        match table.get(reason_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a reason id by normalized text (within transaction)
    pub fn find_reason_id_by_text_txn(
        &self,
        txn: &WriteTransaction,
        text: &str,
    ) -> StorageResult<Option<i64>> {
        let index = txn.open_table(REASON_TEXTS_TABLE)?;
        let key = CancellationReason::normalize(text);
        Ok(index.get(key.as_str())?.map(|guard| guard.value()))
    }

    pub fn list_reasons(&self) -> StorageResult<Vec<CancellationReason>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REASONS_TABLE)?;

        let mut reasons = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            reasons.push(serde_json::from_slice(value.value())?);
        }

        Ok(reasons)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let snapshots_table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let commands_table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let stores_table = read_txn.open_table(STORES_TABLE)?;
        let ledger_table = read_txn.open_table(LEDGER_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            event_count: events_table.len()?,
            snapshot_count: snapshots_table.len()?,
            processed_command_count: commands_table.len()?,
            store_count: stores_table.len()?,
            ledger_entry_count: ledger_table.len()?,
            current_sequence: seq_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub event_count: u64,
    pub snapshot_count: u64,
    pub processed_command_count: u64,
    pub store_count: u64,
    pub ledger_entry_count: u64,
    pub current_sequence: u64,
}
