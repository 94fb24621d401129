//! HTTP error mapping
//!
//! Handlers return [`AppResult`]. Engine failures arrive either as a typed
//! [`ManagerError`] (queries, store and ledger operations) or as the
//! `CommandError` inside a [`CommandResponse`] (order commands); both end
//! up as an [`AppError`] whose [`ErrorCode`] selects the HTTP status. The
//! code table itself lives with [`ErrorCode`] in `shared`.
//!
//! | CommandErrorCode | ErrorCode | HTTP |
//! |------------------|-----------|------|
//! | INVALID_AMOUNT / INVALID_INPUT | InvalidAmount / ValidationFailed | 400 |
//! | TOO_FAR | OutsideServiceArea | 422 |
//! | UNAUTHORIZED | PermissionDenied | 403 |
//! | ORDER_NOT_FOUND / STORE_NOT_FOUND | OrderNotFound / StoreNotFound | 404 |
//! | INVALID_TRANSITION / ALREADY_TERMINAL | InvalidTransition / OrderAlreadyTerminal | 409 |
//! | REFERENCE_MISMATCH / AMOUNT_MISMATCH | PaymentReferenceMismatch / PaymentAmountMismatch | 422 |
//! | SYSTEM_BUSY / STORAGE_FULL | SystemBusy / StorageFull | 503 |

use axum::Json;
use serde::Serialize;

use crate::auth::DenyReason;
use crate::geo::GeofenceError;
use crate::orders::{LedgerError, ManagerError, OrderError, ReasonError};
use shared::order::CommandResponse;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Typed errors carry more detail than the wire code
fn refine(err: &ManagerError) -> Option<ErrorCode> {
    match err {
        ManagerError::Rejected(OrderError::Unauthorized(DenyReason::PaymentRequired)) => {
            Some(ErrorCode::PaymentRequired)
        }
        ManagerError::Rejected(OrderError::Geofence(GeofenceError::InvalidCoordinate {
            ..
        })) => Some(ErrorCode::InvalidCoordinate),
        ManagerError::Rejected(OrderError::Geofence(GeofenceError::InvalidRadius(_))) => {
            Some(ErrorCode::InvalidServiceRadius)
        }
        ManagerError::Rejected(OrderError::Ledger(LedgerError::DuplicatePosting { .. }))
        | ManagerError::Ledger(LedgerError::DuplicatePosting { .. }) => {
            Some(ErrorCode::DuplicatePosting)
        }
        ManagerError::Reason(ReasonError::DuplicateReason(_)) => {
            Some(ErrorCode::CancellationReasonExists)
        }
        ManagerError::Reason(ReasonError::SystemReasonProtected) => {
            Some(ErrorCode::PermissionDenied)
        }
        _ => None,
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let code = refine(&err).unwrap_or_else(|| ErrorCode::from(err.code()));
        AppError::with_message(code, err.to_string())
    }
}

/// Successful command response, or its error as an [`AppError`]
pub fn command_result(response: CommandResponse) -> AppResult<CommandResponse> {
    if response.success {
        return Ok(response);
    }
    match response.error {
        Some(err) => {
            let command_id = response.command_id;
            Err(AppError::from(err).with_detail("command_id", command_id))
        }
        None => Err(AppError::internal("Command failed without an error")),
    }
}

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
