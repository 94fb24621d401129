//! Store ledger accountant
//!
//! Every posting appends entries and rewrites the store's cached
//! `ledger_balance` as the sum of all its entries, inside the caller's write
//! transaction. Entries are never edited; corrections are new `ADJUSTMENT`
//! entries.
//!
//! | Trigger | Entry | Amount |
//! |---------|-------|--------|
//! | Delivered, payment not failed or refunded | `SALE_CREDIT` | `+base_amount` |
//! | Delivered, payment failed or refunded | none | |
//! | Cancelled by merchant/system after acceptance | `CANCELLATION_FEE` | `-fee` |
//! | Cancelled by driver (when configured) | `CANCELLATION_FEE` | `-fee` |
//! | Cancelled by customer | none | |
//! | Refunded after a sale credit | `ADJUSTMENT` | `-base_amount` |

use redb::WriteTransaction;
use shared::models::{BalanceCheck, LedgerEntryKind, Store, StoreLedgerEntry};
use shared::money::Money;
use shared::order::{CancelledBy, OrderSnapshot, PaymentStatus};
use thiserror::Error;

use super::storage::{OrderStorage, StorageError};
use crate::core::EngineConfig;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Store not found: {0}")]
    StoreNotFound(i64),

    #[error("Order {order_id} already has a {kind} posting")]
    DuplicatePosting {
        order_id: String,
        kind: LedgerEntryKind,
    },

    #[error("Insufficient balance for store {store_id}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        store_id: i64,
        balance: Money,
        requested: Money,
    },

    #[error("Invalid ledger amount: {0}")]
    InvalidAmount(String),

    #[error("Adjustment note must not be empty")]
    MissingNote,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why an order-driven posting happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingKind {
    Delivered,
    Cancelled {
        cancelled_by: CancelledBy,
        reached_accepted: bool,
    },
    Refunded,
}

pub struct LedgerAccountant<'a> {
    storage: &'a OrderStorage,
    config: &'a EngineConfig,
}

impl<'a> LedgerAccountant<'a> {
    pub fn new(storage: &'a OrderStorage, config: &'a EngineConfig) -> Self {
        Self { storage, config }
    }

    /// Fee charged to the store for this cancellation, zero when none applies
    pub fn cancellation_fee(
        &self,
        order: &OrderSnapshot,
        cancelled_by: CancelledBy,
        reached_accepted: bool,
    ) -> Money {
        let applies = match cancelled_by {
            CancelledBy::Merchant | CancelledBy::System => reached_accepted,
            CancelledBy::Driver => self.config.charge_store_on_driver_cancel && reached_accepted,
            CancelledBy::Customer => false,
        };
        if applies {
            self.config.cancellation_fee.fee_for(order.base_amount)
        } else {
            Money::ZERO
        }
    }

    /// Post the entries an order transition calls for
    pub fn post(
        &self,
        txn: &WriteTransaction,
        order: &OrderSnapshot,
        kind: PostingKind,
    ) -> Result<Vec<StoreLedgerEntry>, LedgerError> {
        let (entry_kind, amount, note) = match kind {
            PostingKind::Delivered => {
                // Nothing collected, nothing earned
                if matches!(
                    order.payment_status,
                    PaymentStatus::Failed | PaymentStatus::Refunded
                ) {
                    tracing::warn!(
                        order_id = %order.order_id,
                        payment_status = %order.payment_status,
                        "Delivered without collected payment, no sale credit"
                    );
                    return Ok(vec![]);
                }
                (LedgerEntryKind::SaleCredit, order.base_amount, None)
            }
            PostingKind::Cancelled {
                cancelled_by,
                reached_accepted,
            } => {
                let fee = self.cancellation_fee(order, cancelled_by, reached_accepted);
                if fee.is_zero() {
                    return Ok(vec![]);
                }
                (LedgerEntryKind::CancellationFee, -fee, None)
            }
            PostingKind::Refunded => {
                let credited = self.storage.is_posted_txn(
                    txn,
                    &order.order_id,
                    LedgerEntryKind::SaleCredit,
                )?;
                if !credited {
                    return Ok(vec![]);
                }
                (
                    LedgerEntryKind::Adjustment,
                    -order.base_amount,
                    Some("Refund reversal of sale credit".to_string()),
                )
            }
        };

        if self
            .storage
            .is_posted_txn(txn, &order.order_id, entry_kind)?
        {
            return Err(LedgerError::DuplicatePosting {
                order_id: order.order_id.clone(),
                kind: entry_kind,
            });
        }

        let entry = self.append(
            txn,
            order.store_id,
            Some(order.order_id.clone()),
            amount,
            entry_kind,
            note,
        )?;
        self.storage
            .mark_posted(txn, &order.order_id, entry_kind, entry.entry_id)?;

        tracing::info!(
            order_id = %order.order_id,
            store_id = order.store_id,
            entry_id = entry.entry_id,
            kind = %entry_kind,
            amount = %amount,
            "Ledger entry posted"
        );
        Ok(vec![entry])
    }

    /// Money paid out to a store; never more than its balance
    pub fn record_payout(
        &self,
        txn: &WriteTransaction,
        store_id: i64,
        amount: Money,
        note: Option<String>,
    ) -> Result<StoreLedgerEntry, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "payout must be positive, got {amount}"
            )));
        }
        let balance = self.storage.sum_ledger_entries_txn(txn, store_id)?;
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                store_id,
                balance,
                requested: amount,
            });
        }
        self.append(txn, store_id, None, -amount, LedgerEntryKind::PayoutDebit, note)
    }

    /// Offsetting entry correcting an earlier posting
    pub fn post_adjustment(
        &self,
        txn: &WriteTransaction,
        store_id: i64,
        order_id: Option<String>,
        amount: Money,
        note: &str,
    ) -> Result<StoreLedgerEntry, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "adjustment must be non-zero".to_string(),
            ));
        }
        let note = note.trim();
        if note.is_empty() {
            return Err(LedgerError::MissingNote);
        }
        self.append(
            txn,
            store_id,
            order_id,
            amount,
            LedgerEntryKind::Adjustment,
            Some(note.to_string()),
        )
    }

    /// Insert one entry and recompute the store balance from all entries
    fn append(
        &self,
        txn: &WriteTransaction,
        store_id: i64,
        order_id: Option<String>,
        amount: Money,
        kind: LedgerEntryKind,
        note: Option<String>,
    ) -> Result<StoreLedgerEntry, LedgerError> {
        let mut store: Store = self
            .storage
            .get_store_txn(txn, store_id)?
            .ok_or(LedgerError::StoreNotFound(store_id))?;

        let now = shared::util::now_millis();
        let entry = StoreLedgerEntry {
            entry_id: self.storage.next_ledger_entry_id(txn)?,
            store_id,
            order_id,
            amount,
            kind,
            note,
            created_at: now,
        };
        self.storage.append_ledger_entry(txn, &entry)?;

        store.ledger_balance = self.storage.sum_ledger_entries_txn(txn, store_id)?;
        store.updated_at = now;
        self.storage.put_store(txn, &store)?;

        Ok(entry)
    }
}

/// Recompute a store's balance from committed entries
pub fn verify_store_balance(
    storage: &OrderStorage,
    store_id: i64,
) -> Result<BalanceCheck, LedgerError> {
    let store = storage
        .get_store(store_id)?
        .ok_or(LedgerError::StoreNotFound(store_id))?;
    let computed = storage.sum_ledger_entries(store_id)?;
    let check = BalanceCheck {
        store_id,
        cached: store.ledger_balance,
        computed,
    };
    if !check.is_consistent() {
        tracing::error!(
            store_id,
            cached = %check.cached,
            computed = %check.computed,
            "Store balance drift detected"
        );
    }
    Ok(check)
}
