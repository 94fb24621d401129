//! OrderCreated event applier
//!
//! Fills the empty shell produced by `OrderSnapshot::new` with the frozen
//! checkout data. The order starts `PENDING` with payment `PENDING`.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, PaymentStatus};

/// OrderCreated applier
pub struct OrderCreatedApplier;

impl EventApplier for OrderCreatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCreated {
            customer_id,
            store_id,
            items,
            base_amount,
            markup_amount,
            delivery_fee,
            total_amount,
            delivery_location,
            payment_reference,
            require_payment_before_accept,
        } = &event.payload
        {
            snapshot.customer_id = customer_id.clone();
            snapshot.store_id = *store_id;
            snapshot.items = items.clone();
            snapshot.base_amount = *base_amount;
            snapshot.markup_amount = *markup_amount;
            snapshot.delivery_fee = *delivery_fee;
            snapshot.total_amount = *total_amount;
            snapshot.delivery_location = *delivery_location;
            snapshot.payment_reference = payment_reference.clone();
            snapshot.require_payment_before_accept = *require_payment_before_accept;

            snapshot.status = OrderStatus::Pending;
            snapshot.furthest_status = OrderStatus::Pending;
            snapshot.payment_status = PaymentStatus::Pending;
            snapshot.created_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
