//! OrderDelivered event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderDelivered applier
pub struct OrderDeliveredApplier;

impl EventApplier for OrderDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderDelivered { .. } = &event.payload {
            snapshot.status = OrderStatus::Delivered;
            snapshot.furthest_status = OrderStatus::Delivered;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::testing::{event, test_order};
    use shared::order::Actor;

    #[test]
    fn test_order_delivered_is_terminal() {
        let mut snapshot = test_order("order-1", OrderStatus::OutForDelivery);
        snapshot.driver_id = Some("driver-1".to_string());
        let event = event(
            "order-1",
            8,
            Actor::driver("driver-1"),
            EventPayload::OrderDelivered {
                ledger_entry_ids: vec![1],
            },
        );
        OrderDeliveredApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, OrderStatus::Delivered);
        assert!(snapshot.is_terminal());
        assert_eq!(snapshot.driver_id.as_deref(), Some("driver-1"));
        assert!(snapshot.verify_checksum());
    }
}
