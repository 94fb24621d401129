//! Cancellation reason catalog
//!
//! The order engine only reads reasons (inside the cancellation
//! transaction). Registration and deactivation are the admin
//! collaborator's entry points and run in their own transactions.

use redb::WriteTransaction;
use shared::models::{CancellationReason, SYSTEM_REASON_ID};
use shared::order::CancelledBy;
use thiserror::Error;

use super::storage::{OrderStorage, StorageError};
use super::traits::OrderError;

/// Longest accepted reason text, in characters
pub const MAX_REASON_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ReasonError {
    #[error("Reason text must not be empty")]
    EmptyText,

    #[error("Reason text exceeds {MAX_REASON_LEN} characters")]
    TooLong,

    #[error("Cancellation reason already exists: {0}")]
    DuplicateReason(String),

    #[error("Cancellation reason not found: {0}")]
    NotFound(i64),

    #[error("The system cancellation reason cannot be modified")]
    SystemReasonProtected,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Catalog view over order storage
#[derive(Clone, Copy)]
pub struct ReasonCatalog<'a> {
    storage: &'a OrderStorage,
}

impl<'a> ReasonCatalog<'a> {
    pub fn new(storage: &'a OrderStorage) -> Self {
        Self { storage }
    }

    pub fn get(
        &self,
        txn: &WriteTransaction,
        reason_id: i64,
    ) -> Result<Option<CancellationReason>, StorageError> {
        self.storage.get_reason_txn(txn, reason_id)
    }

    /// Reason must exist and be active; the sentinel is reserved for system
    pub fn require_valid(
        &self,
        txn: &WriteTransaction,
        reason_id: i64,
        cancelled_by: CancelledBy,
    ) -> Result<CancellationReason, OrderError> {
        if reason_id == SYSTEM_REASON_ID && cancelled_by != CancelledBy::System {
            return Err(OrderError::InvalidCancellationReason(
                "system reason is reserved for automated cancellations".to_string(),
            ));
        }
        let reason = self.get(txn, reason_id)?.ok_or_else(|| {
            OrderError::InvalidCancellationReason(format!("unknown reason {reason_id}"))
        })?;
        if !reason.is_active {
            return Err(OrderError::InvalidCancellationReason(format!(
                "reason {reason_id} is inactive"
            )));
        }
        Ok(reason)
    }

    pub fn list(&self) -> Result<Vec<CancellationReason>, StorageError> {
        self.storage.list_reasons()
    }

    /// Add a reason; text is unique ignoring case and surrounding space
    pub fn register(&self, reason_text: &str) -> Result<CancellationReason, ReasonError> {
        let text = reason_text.trim();
        if text.is_empty() {
            return Err(ReasonError::EmptyText);
        }
        if text.chars().count() > MAX_REASON_LEN {
            return Err(ReasonError::TooLong);
        }

        let txn = self.storage.begin_write()?;
        if self.storage.find_reason_id_by_text_txn(&txn, text)?.is_some() {
            return Err(ReasonError::DuplicateReason(text.to_string()));
        }

        let reason = CancellationReason {
            id: shared::util::snowflake_id(),
            reason_text: text.to_string(),
            is_active: true,
            created_at: shared::util::now_millis(),
        };
        self.storage.put_reason(&txn, &reason)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(reason_id = reason.id, reason_text = %reason.reason_text, "Cancellation reason registered");
        Ok(reason)
    }

    /// Retire a reason. Existing orders keep referencing it.
    pub fn deactivate(&self, reason_id: i64) -> Result<CancellationReason, ReasonError> {
        if reason_id == SYSTEM_REASON_ID {
            return Err(ReasonError::SystemReasonProtected);
        }

        let txn = self.storage.begin_write()?;
        let mut reason = self
            .storage
            .get_reason_txn(&txn, reason_id)?
            .ok_or(ReasonError::NotFound(reason_id))?;
        reason.is_active = false;
        self.storage.put_reason(&txn, &reason)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(reason_id, "Cancellation reason deactivated");
        Ok(reason)
    }
}
