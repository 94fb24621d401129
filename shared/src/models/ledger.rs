//! Store Ledger Model

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger entry kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    /// Store's share of a delivered order
    SaleCredit,
    /// Penalty for a merchant-side cancellation after acceptance
    CancellationFee,
    /// Money paid out to the store
    PayoutDebit,
    /// Correcting entry (refund reversal, manual fix)
    Adjustment,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::SaleCredit => "SALE_CREDIT",
            LedgerEntryKind::CancellationFee => "CANCELLATION_FEE",
            LedgerEntryKind::PayoutDebit => "PAYOUT_DEBIT",
            LedgerEntryKind::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only store ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreLedgerEntry {
    /// Global ledger sequence
    pub entry_id: u64,
    pub store_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Signed: credits positive, debits negative
    pub amount: Money,
    pub kind: LedgerEntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
}

/// Record payout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub amount: Money,
    pub note: Option<String>,
}

/// Post adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub order_id: Option<String>,
    pub amount: Money,
    pub note: String,
}

/// Result of recomputing a store balance from its entries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceCheck {
    pub store_id: i64,
    pub cached: Money,
    pub computed: Money,
}

impl BalanceCheck {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.computed
    }
}
