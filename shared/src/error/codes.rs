//! Unified error codes for the delivery platform
//!
//! Error codes are shared by the order server and its HTTP clients.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Store errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Ledger errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for compact serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// Caller identity missing
    NotAuthenticated = 1001,
    /// Caller role header is not a known role
    InvalidActorRole = 1002,

    // ==================== 2xxx: Permission ====================
    /// Actor may not perform this transition
    PermissionDenied = 2001,

    // ==================== 3xxx: Store ====================
    /// Store not found
    StoreNotFound = 3001,
    /// Store is closed or unverified
    StoreUnavailable = 3002,
    /// Delivery location outside the store's service radius
    OutsideServiceArea = 3003,
    /// Latitude or longitude out of range
    InvalidCoordinate = 3004,
    /// Service radius is not a positive distance
    InvalidServiceRadius = 3005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Transition not allowed from the current status
    InvalidTransition = 4002,
    /// Order is delivered or cancelled
    OrderAlreadyTerminal = 4003,
    /// Order has no items
    OrderEmpty = 4004,
    /// Amount is negative, malformed or overflows
    InvalidAmount = 4005,
    /// Cancellation reason unknown or not allowed for this actor
    InvalidCancellationReason = 4006,
    /// Cancellation reason text already registered
    CancellationReasonExists = 4007,

    // ==================== 5xxx: Payment ====================
    /// Gateway reference does not match the order
    PaymentReferenceMismatch = 5001,
    /// Gateway amount does not match the order total
    PaymentAmountMismatch = 5002,
    /// Payment status can no longer move
    PaymentAlreadyFinal = 5003,
    /// Gateway verification failed
    PaymentVerificationFailed = 5004,
    /// Order must be paid before the merchant accepts it
    PaymentRequired = 5005,

    // ==================== 6xxx: Ledger ====================
    /// Ledger posting failed
    LedgerPostingFailed = 6001,
    /// Posting already recorded for this order
    DuplicatePosting = 6002,
    /// Store balance too low for the payout
    InsufficientBalance = 6003,
    /// Store balance does not match its entries
    LedgerImbalance = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
    /// Out of memory
    OutOfMemory = 9402,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "Caller is not identified",
            ErrorCode::InvalidActorRole => "Unknown actor role",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Store
            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::StoreUnavailable => "Store is not accepting orders",
            ErrorCode::OutsideServiceArea => "Delivery location is outside the service area",
            ErrorCode::InvalidCoordinate => "Coordinate is out of range",
            ErrorCode::InvalidServiceRadius => "Service radius must be positive",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Transition not allowed from current status",
            ErrorCode::OrderAlreadyTerminal => "Order is already delivered or cancelled",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::InvalidCancellationReason => "Invalid cancellation reason",
            ErrorCode::CancellationReasonExists => "Cancellation reason already exists",

            // Payment
            ErrorCode::PaymentReferenceMismatch => "Payment reference does not match order",
            ErrorCode::PaymentAmountMismatch => "Payment amount does not match order total",
            ErrorCode::PaymentAlreadyFinal => "Payment status can no longer change",
            ErrorCode::PaymentVerificationFailed => "Payment verification failed",
            ErrorCode::PaymentRequired => "Payment must be charged first",

            // Ledger
            ErrorCode::LedgerPostingFailed => "Ledger posting failed",
            ErrorCode::DuplicatePosting => "Ledger entry already posted for this order",
            ErrorCode::InsufficientBalance => "Insufficient store balance",
            ErrorCode::LedgerImbalance => "Store balance does not match ledger entries",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidActorRole),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Store
            3001 => Ok(ErrorCode::StoreNotFound),
            3002 => Ok(ErrorCode::StoreUnavailable),
            3003 => Ok(ErrorCode::OutsideServiceArea),
            3004 => Ok(ErrorCode::InvalidCoordinate),
            3005 => Ok(ErrorCode::InvalidServiceRadius),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderAlreadyTerminal),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::InvalidAmount),
            4006 => Ok(ErrorCode::InvalidCancellationReason),
            4007 => Ok(ErrorCode::CancellationReasonExists),

            // Payment
            5001 => Ok(ErrorCode::PaymentReferenceMismatch),
            5002 => Ok(ErrorCode::PaymentAmountMismatch),
            5003 => Ok(ErrorCode::PaymentAlreadyFinal),
            5004 => Ok(ErrorCode::PaymentVerificationFailed),
            5005 => Ok(ErrorCode::PaymentRequired),

            // Ledger
            6001 => Ok(ErrorCode::LedgerPostingFailed),
            6002 => Ok(ErrorCode::DuplicatePosting),
            6003 => Ok(ErrorCode::InsufficientBalance),
            6004 => Ok(ErrorCode::LedgerImbalance),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9402 => Ok(ErrorCode::OutOfMemory),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
