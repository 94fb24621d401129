//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::StoreNotFound | Self::OrderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (state races, duplicates)
            Self::AlreadyExists
            | Self::InvalidTransition
            | Self::OrderAlreadyTerminal
            | Self::CancellationReasonExists
            | Self::PaymentAlreadyFinal
            | Self::DuplicatePosting => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::InvalidActorRole => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // 402 Payment Required
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,

            // 422 Unprocessable (well-formed but rejected by business rules)
            Self::OutsideServiceArea
            | Self::StoreUnavailable
            | Self::PaymentReferenceMismatch
            | Self::PaymentAmountMismatch
            | Self::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Bad Gateway (payment provider)
            Self::PaymentVerificationFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError
            | Self::TimeoutError
            | Self::SystemBusy
            | Self::StorageFull
            | Self::OutOfMemory => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageCorrupted
            | Self::LedgerPostingFailed
            | Self::LedgerImbalance
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::StoreNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::InvalidTransition.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::OrderAlreadyTerminal.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_defaults_to_bad_request() {
        assert_eq!(
            ErrorCode::InvalidCoordinate.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::InvalidAmount.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_system_statuses() {
        assert_eq!(
            ErrorCode::SystemBusy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::StorageCorrupted.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
