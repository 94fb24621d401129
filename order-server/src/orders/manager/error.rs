use super::super::ledger::LedgerError;
use super::super::reasons::ReasonError;
use super::super::storage::StorageError;
use super::super::traits::OrderError;
use crate::geo::GeofenceError;
use crate::payment::ReconciliationError;
use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(i64),

    /// Business rule rejected the command
    #[error(transparent)]
    Rejected(OrderError),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Reason(ReasonError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classify a storage failure into a caller-facing code
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) | StorageError::BalanceOverflow(_) => {
            return CommandErrorCode::InternalError;
        }
        StorageError::OrderNotFound(_) => return CommandErrorCode::OrderNotFound,
        _ => {}
    }

    // redb errors only expose their cause through the message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit and allocation failures
    CommandErrorCode::SystemBusy
}

fn ledger_code(e: &LedgerError) -> CommandErrorCode {
    match e {
        LedgerError::StoreNotFound(_) => CommandErrorCode::StoreNotFound,
        LedgerError::InsufficientBalance { .. } => CommandErrorCode::InsufficientBalance,
        LedgerError::InvalidAmount(_) | LedgerError::MissingNote => CommandErrorCode::InvalidAmount,
        LedgerError::DuplicatePosting { .. } | LedgerError::Storage(_) => {
            CommandErrorCode::LedgerError
        }
    }
}

fn order_code(e: &OrderError) -> CommandErrorCode {
    match e {
        OrderError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
        OrderError::AlreadyTerminal { .. } => CommandErrorCode::AlreadyTerminal,
        OrderError::InvalidTransition { .. } => CommandErrorCode::InvalidTransition,
        OrderError::Unauthorized(_) => CommandErrorCode::Unauthorized,
        OrderError::InvalidAmount(_) => CommandErrorCode::InvalidAmount,
        OrderError::InvalidInput(_) => CommandErrorCode::InvalidInput,
        OrderError::Geofence(GeofenceError::TooFar { .. }) => CommandErrorCode::TooFar,
        OrderError::Geofence(_) => CommandErrorCode::InvalidInput,
        OrderError::StoreNotFound(_) => CommandErrorCode::StoreNotFound,
        OrderError::StoreUnavailable(_) => CommandErrorCode::StoreUnavailable,
        OrderError::InvalidCancellationReason(_) => CommandErrorCode::InvalidCancellationReason,
        OrderError::Ledger(e) => ledger_code(e),
        OrderError::Reconciliation(e) => match e {
            ReconciliationError::ReferenceMismatch { .. } => CommandErrorCode::ReferenceMismatch,
            ReconciliationError::AmountMismatch { .. } => CommandErrorCode::AmountMismatch,
            ReconciliationError::AlreadyFinal { .. } => CommandErrorCode::AlreadyFinal,
            ReconciliationError::Verification(_) => CommandErrorCode::InternalError,
        },
        OrderError::Storage(e) => classify_storage_error(e),
    }
}

impl ManagerError {
    /// Caller-facing error code
    pub fn code(&self) -> CommandErrorCode {
        match self {
            ManagerError::Storage(e) => classify_storage_error(e),
            ManagerError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
            ManagerError::StoreNotFound(_) => CommandErrorCode::StoreNotFound,
            ManagerError::Rejected(e) => order_code(e),
            ManagerError::Ledger(e) => ledger_code(e),
            ManagerError::Reason(ReasonError::Storage(e)) => classify_storage_error(e),
            ManagerError::Reason(ReasonError::NotFound(_)) => {
                CommandErrorCode::InvalidCancellationReason
            }
            ManagerError::Reason(_) | ManagerError::InvalidInput(_) => {
                CommandErrorCode::InvalidInput
            }
            ManagerError::Unauthorized(_) => CommandErrorCode::Unauthorized,
            ManagerError::Internal(_) => CommandErrorCode::InternalError,
        }
    }
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let code = err.code();
        if let ManagerError::Storage(e) = &err {
            tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
        }
        CommandError::new(code, err.to_string())
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::Storage(e) => ManagerError::Storage(e),
            OrderError::Ledger(LedgerError::Storage(e)) => ManagerError::Storage(e),
            other => ManagerError::Rejected(other),
        }
    }
}

impl From<LedgerError> for ManagerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(e) => ManagerError::Storage(e),
            LedgerError::StoreNotFound(id) => ManagerError::StoreNotFound(id),
            other => ManagerError::Ledger(other),
        }
    }
}

impl From<ReasonError> for ManagerError {
    fn from(err: ReasonError) -> Self {
        match err {
            ReasonError::Storage(e) => ManagerError::Storage(e),
            other => ManagerError::Reason(other),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
