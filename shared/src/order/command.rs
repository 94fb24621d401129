//! Order commands - requests to change an order

use super::types::{Actor, GeoPoint, OrderItemInput, PaymentStatus};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Order command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Idempotency key; a replayed id is acknowledged without effect
    pub command_id: String,
    /// Authenticated caller
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(actor: Actor, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: Some(crate::util::now_millis()),
            payload,
        }
    }

    /// Same command with a caller-supplied idempotency key
    pub fn with_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = command_id.into();
        self
    }

    /// Order targeted by this command, `None` for creation
    pub fn target_order_id(&self) -> Option<&str> {
        self.payload.order_id()
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Customer checkout
    CreateOrder {
        store_id: i64,
        items: Vec<OrderItemInput>,
        delivery_fee: Money,
        delivery_location: GeoPoint,
        /// Gateway transaction reference issued at checkout
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_reference: Option<String>,
        /// Total shown to the customer; must equal the computed total
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_total: Option<Money>,
    },
    AcceptOrder {
        order_id: String,
    },
    /// Merchant declines a pending order
    RejectOrder {
        order_id: String,
        reason_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    StartPreparing {
        order_id: String,
    },
    MarkReadyForPickup {
        order_id: String,
    },
    /// Driver claims a ready order
    AcceptDelivery {
        order_id: String,
    },
    PickUpOrder {
        order_id: String,
    },
    MarkDelivered {
        order_id: String,
    },
    CancelOrder {
        order_id: String,
        reason_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// Apply a verified gateway outcome
    ReconcilePayment {
        order_id: String,
        gateway_reference: String,
        status: PaymentStatus,
        amount: Money,
    },
}

impl OrderCommandPayload {
    pub fn order_id(&self) -> Option<&str> {
        match self {
            OrderCommandPayload::CreateOrder { .. } => None,
            OrderCommandPayload::AcceptOrder { order_id }
            | OrderCommandPayload::RejectOrder { order_id, .. }
            | OrderCommandPayload::StartPreparing { order_id }
            | OrderCommandPayload::MarkReadyForPickup { order_id }
            | OrderCommandPayload::AcceptDelivery { order_id }
            | OrderCommandPayload::PickUpOrder { order_id }
            | OrderCommandPayload::MarkDelivered { order_id }
            | OrderCommandPayload::CancelOrder { order_id, .. }
            | OrderCommandPayload::ReconcilePayment { order_id, .. } => Some(order_id),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommandPayload::CreateOrder { .. } => "create_order",
            OrderCommandPayload::AcceptOrder { .. } => "accept_order",
            OrderCommandPayload::RejectOrder { .. } => "reject_order",
            OrderCommandPayload::StartPreparing { .. } => "start_preparing",
            OrderCommandPayload::MarkReadyForPickup { .. } => "mark_ready_for_pickup",
            OrderCommandPayload::AcceptDelivery { .. } => "accept_delivery",
            OrderCommandPayload::PickUpOrder { .. } => "pick_up_order",
            OrderCommandPayload::MarkDelivered { .. } => "mark_delivered",
            OrderCommandPayload::CancelOrder { .. } => "cancel_order",
            OrderCommandPayload::ReconcilePayment { .. } => "reconcile_payment",
        }
    }
}
