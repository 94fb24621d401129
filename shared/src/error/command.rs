//! Order command failures as API errors
//!
//! A [`CommandError`] travels inside a `CommandResponse`; handlers that
//! surface it over HTTP convert it here so the status follows the
//! [`ErrorCode`] table.

use super::codes::ErrorCode;
use super::types::AppError;
use crate::order::{CommandError, CommandErrorCode};

impl From<CommandErrorCode> for ErrorCode {
    fn from(code: CommandErrorCode) -> Self {
        match code {
            CommandErrorCode::InvalidAmount => ErrorCode::InvalidAmount,
            CommandErrorCode::InvalidInput => ErrorCode::ValidationFailed,
            CommandErrorCode::TooFar => ErrorCode::OutsideServiceArea,
            CommandErrorCode::StoreNotFound => ErrorCode::StoreNotFound,
            CommandErrorCode::StoreUnavailable => ErrorCode::StoreUnavailable,
            CommandErrorCode::InvalidCancellationReason => ErrorCode::InvalidCancellationReason,
            CommandErrorCode::Unauthorized => ErrorCode::PermissionDenied,
            CommandErrorCode::OrderNotFound => ErrorCode::OrderNotFound,
            CommandErrorCode::InvalidTransition => ErrorCode::InvalidTransition,
            CommandErrorCode::AlreadyTerminal => ErrorCode::OrderAlreadyTerminal,
            CommandErrorCode::LedgerError => ErrorCode::LedgerPostingFailed,
            CommandErrorCode::InsufficientBalance => ErrorCode::InsufficientBalance,
            CommandErrorCode::ReferenceMismatch => ErrorCode::PaymentReferenceMismatch,
            CommandErrorCode::AmountMismatch => ErrorCode::PaymentAmountMismatch,
            CommandErrorCode::AlreadyFinal => ErrorCode::PaymentAlreadyFinal,
            CommandErrorCode::InternalError => ErrorCode::InternalError,
            CommandErrorCode::StorageFull => ErrorCode::StorageFull,
            CommandErrorCode::StorageCorrupted => ErrorCode::StorageCorrupted,
            CommandErrorCode::SystemBusy => ErrorCode::SystemBusy,
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::with_message(err.code.into(), err.message)
    }
}
