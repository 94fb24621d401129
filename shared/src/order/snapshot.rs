//! Order snapshot - computed state from event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection.
//! Rebuilding an order from its events must reproduce the same checksum.

use super::types::{CancelledBy, GeoPoint, OrderItem, PaymentStatus};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    ReadyForPickup,
    Assigned,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the happy path, `None` for `Cancelled`
    pub fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Accepted => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::ReadyForPickup => Some(3),
            OrderStatus::Assigned => Some(4),
            OrderStatus::OutForDelivery => Some(5),
            OrderStatus::Delivered => Some(6),
            OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::ReadyForPickup => write!(f, "READY_FOR_PICKUP"),
            OrderStatus::Assigned => write!(f, "ASSIGNED"),
            OrderStatus::OutForDelivery => write!(f, "OUT_FOR_DELIVERY"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Order snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by server)
    pub order_id: String,
    pub customer_id: String,
    pub store_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Gateway transaction reference captured at checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    /// Merchant may only accept once the payment is charged
    #[serde(default)]
    pub require_payment_before_accept: bool,
    /// Highest status reached before cancellation (fee policy input)
    #[serde(default)]
    pub furthest_status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub base_amount: Money,
    pub markup_amount: Money,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub delivery_location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<CancelledBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_note: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last update timestamp (Unix millis)
    pub updated_at: i64,
    /// Last applied event sequence
    pub last_sequence: u64,
    /// Computed from: status, payment_status, total_amount, last_sequence
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create an empty order shell, filled in by the creation event
    pub fn new(order_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Self {
            order_id,
            customer_id: String::new(),
            store_id: 0,
            driver_id: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            require_payment_before_accept: false,
            furthest_status: OrderStatus::Pending,
            items: Vec::new(),
            base_amount: Money::ZERO,
            markup_amount: Money::ZERO,
            delivery_fee: Money::ZERO,
            total_amount: Money::ZERO,
            delivery_location: GeoPoint::new(0.0, 0.0),
            cancelled_by: None,
            cancellation_reason_id: None,
            cancellation_note: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the order got at least as far as `status` on the happy path
    pub fn has_reached(&self, status: OrderStatus) -> bool {
        match (self.furthest_status.rank(), status.rank()) {
            (Some(reached), Some(wanted)) => reached >= wanted,
            _ => false,
        }
    }

    /// `total_amount == base_amount + markup_amount + delivery_fee`
    pub fn totals_consistent(&self) -> bool {
        Money::checked_sum([self.base_amount, self.markup_amount, self.delivery_fee])
            == Some(self.total_amount)
    }

    /// Compute state checksum
    pub fn compute_checksum(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.order_id.as_bytes());
        hasher.update(self.status.to_string().as_bytes());
        hasher.update(self.payment_status.to_string().as_bytes());
        hasher.update(self.total_amount.minor().to_le_bytes());
        hasher.update(self.last_sequence.to_le_bytes());
        hex::encode(&hasher.finalize()[..8])
    }

    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot_is_pending() {
        let snapshot = OrderSnapshot::new("order-1".to_string());
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.payment_status, PaymentStatus::Pending);
        assert!(snapshot.verify_checksum());
        assert!(snapshot.totals_consistent());
    }

    #[test]
    fn test_totals_consistent() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.base_amount = Money::from_minor(8000);
        snapshot.markup_amount = Money::from_minor(1200);
        snapshot.delivery_fee = Money::from_minor(800);
        snapshot.total_amount = Money::from_minor(10000);
        assert!(snapshot.totals_consistent());

        snapshot.total_amount = Money::from_minor(9999);
        assert!(!snapshot.totals_consistent());
    }

    #[test]
    fn test_has_reached() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        assert!(snapshot.has_reached(OrderStatus::Pending));
        assert!(!snapshot.has_reached(OrderStatus::Accepted));

        snapshot.furthest_status = OrderStatus::Preparing;
        assert!(snapshot.has_reached(OrderStatus::Accepted));
        assert!(!snapshot.has_reached(OrderStatus::Cancelled));
    }

    #[test]
    fn test_checksum_tracks_status() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        let before = snapshot.state_checksum.clone();
        snapshot.status = OrderStatus::Accepted;
        assert!(!snapshot.verify_checksum());
        snapshot.update_checksum();
        assert_ne!(snapshot.state_checksum, before);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }
}
