//! Shared types for the order lifecycle

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Actors
// ============================================================================

/// Role of an already-authenticated caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Merchant,
    Driver,
    /// Payment adapter, timers and other in-house automation
    System,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Customer => write!(f, "CUSTOMER"),
            ActorRole::Merchant => write!(f, "MERCHANT"),
            ActorRole::Driver => write!(f, "DRIVER"),
            ActorRole::System => write!(f, "SYSTEM"),
        }
    }
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(ActorRole::Customer),
            "MERCHANT" => Ok(ActorRole::Merchant),
            "DRIVER" => Ok(ActorRole::Driver),
            "SYSTEM" => Ok(ActorRole::System),
            other => Err(format!("unknown actor role: {other}")),
        }
    }
}

/// Authenticated caller, passed explicitly with every command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(id, ActorRole::Customer)
    }

    pub fn merchant(id: impl Into<String>) -> Self {
        Self::new(id, ActorRole::Merchant)
    }

    pub fn driver(id: impl Into<String>) -> Self {
        Self::new(id, ActorRole::Driver)
    }

    pub fn system() -> Self {
        Self::new("system", ActorRole::System)
    }
}

/// Party recorded as having cancelled an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    Customer,
    Merchant,
    Driver,
    System,
}

impl From<ActorRole> for CancelledBy {
    fn from(role: ActorRole) -> Self {
        match role {
            ActorRole::Customer => CancelledBy::Customer,
            ActorRole::Merchant => CancelledBy::Merchant,
            ActorRole::Driver => CancelledBy::Driver,
            ActorRole::System => CancelledBy::System,
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment axis, independent of order status. Forward-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Charged,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Whether `self -> next` moves forward. Equal statuses are not a move.
    pub fn can_advance_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Charged)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Charged, PaymentStatus::Refunded)
                | (PaymentStatus::Failed, PaymentStatus::Refunded)
        )
    }

    pub fn is_final(self) -> bool {
        self == PaymentStatus::Refunded
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Charged => write!(f, "CHARGED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Transaction status as reported by the payment gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
}

impl GatewayStatus {
    pub fn to_payment_status(self) -> PaymentStatus {
        match self {
            GatewayStatus::Success => PaymentStatus::Charged,
            GatewayStatus::Failed | GatewayStatus::Abandoned => PaymentStatus::Failed,
            GatewayStatus::Reversed => PaymentStatus::Refunded,
        }
    }
}

/// Payload shape shared by gateway callbacks and verification responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayTransaction {
    pub reference: String,
    pub status: GatewayStatus,
    pub amount: Money,
}

// ============================================================================
// Location
// ============================================================================

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ============================================================================
// Items
// ============================================================================

/// Line item as submitted by the customer app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    /// Catalog price at order time
    pub price: Money,
    /// Platform markup per unit at order time
    #[serde(default)]
    pub markup: Money,
}

/// Line item frozen at creation; never mutated afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub price_at_time: Money,
    pub markup_at_time: Money,
}

impl OrderItem {
    pub fn base_total(&self) -> Option<Money> {
        self.price_at_time.checked_mul(i64::from(self.quantity))
    }

    pub fn markup_total(&self) -> Option<Money> {
        self.markup_at_time.checked_mul(i64::from(self.quantity))
    }
}

// ============================================================================
// Command responses
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Order the command created or mutated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Order state after commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<super::snapshot::OrderSnapshot>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order: Option<super::snapshot::OrderSnapshot>) -> Self {
        Self {
            command_id,
            success: true,
            order_id: order.as_ref().map(|o| o.order_id.clone()),
            order,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            order: None,
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            order: None,
            error: None,
        }
    }

    pub fn error_code(&self) -> Option<&CommandErrorCode> {
        self.error.as_ref().map(|e| &e.code)
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    // Validation
    InvalidAmount,
    InvalidInput,
    TooFar,
    StoreNotFound,
    StoreUnavailable,
    InvalidCancellationReason,
    // Authorization
    Unauthorized,
    // State
    OrderNotFound,
    InvalidTransition,
    AlreadyTerminal,
    // Ledger
    LedgerError,
    InsufficientBalance,
    // Reconciliation
    ReferenceMismatch,
    AmountMismatch,
    AlreadyFinal,
    // System
    InternalError,
    StorageFull,
    StorageCorrupted,
    SystemBusy,
}
