//! Order events - immutable facts recorded after command processing

use super::snapshot::OrderStatus;
use super::types::{Actor, CancelledBy, GeoPoint, OrderItem, PaymentStatus};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds), authoritative
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds), audit only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Caller that triggered this event
    pub actor: Actor,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    pub event_type: OrderEventType,
    pub payload: EventPayload,
}

impl OrderEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor: Actor,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            client_timestamp,
            actor,
            command_id,
            event_type,
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    StatusAdvanced,
    DriverAssigned,
    OrderDelivered,
    OrderCancelled,
    PaymentStatusChanged,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderCreated => write!(f, "ORDER_CREATED"),
            OrderEventType::StatusAdvanced => write!(f, "STATUS_ADVANCED"),
            OrderEventType::DriverAssigned => write!(f, "DRIVER_ASSIGNED"),
            OrderEventType::OrderDelivered => write!(f, "ORDER_DELIVERED"),
            OrderEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventType::PaymentStatusChanged => write!(f, "PAYMENT_STATUS_CHANGED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderCreated {
        customer_id: String,
        store_id: i64,
        items: Vec<OrderItem>,
        base_amount: Money,
        markup_amount: Money,
        delivery_fee: Money,
        total_amount: Money,
        delivery_location: GeoPoint,
        #[serde(skip_serializing_if = "Option::is_none")]
        payment_reference: Option<String>,
        require_payment_before_accept: bool,
    },

    /// Happy-path step without side effects (accept, prepare, ready, pick up)
    StatusAdvanced {
        from: OrderStatus,
        to: OrderStatus,
    },

    DriverAssigned {
        driver_id: String,
    },

    OrderDelivered {
        /// Ledger entries posted with this transition
        ledger_entry_ids: Vec<u64>,
    },

    OrderCancelled {
        from: OrderStatus,
        cancelled_by: CancelledBy,
        reason_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        /// Ledger entries posted with this transition (empty when no fee)
        ledger_entry_ids: Vec<u64>,
    },

    PaymentStatusChanged {
        from: PaymentStatus,
        to: PaymentStatus,
        gateway_reference: String,
        amount: Money,
        #[serde(default)]
        ledger_entry_ids: Vec<u64>,
    },
}

/// Lightweight change notification for realtime subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderChangeEvent {
    pub order_id: String,
    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub sequence: u64,
}
