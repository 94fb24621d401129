//! PaymentStatusChanged event applier
//!
//! Touches only the payment axis; order status is independent.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// PaymentStatusChanged applier
pub struct PaymentStatusChangedApplier;

impl EventApplier for PaymentStatusChangedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentStatusChanged { to, .. } = &event.payload {
            snapshot.payment_status = *to;

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
    use shared::money::Money;
    use shared::order::{Actor, OrderStatus, PaymentStatus};

    #[test]
    fn test_payment_status_changed_leaves_order_status() {
        let mut snapshot = test_order("order-1", OrderStatus::Cancelled);
        snapshot.payment_status = PaymentStatus::Charged;
        let event = event(
            "order-1",
            6,
            Actor::system(),
            EventPayload::PaymentStatusChanged {
                from: PaymentStatus::Charged,
                to: PaymentStatus::Refunded,
                gateway_reference: "R-1".to_string(),
                amount: Money::from_minor(10000),
                ledger_entry_ids: vec![],
            },
        );
        PaymentStatusChangedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.payment_status, PaymentStatus::Refunded);
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.last_sequence, 6);
        assert!(snapshot.verify_checksum());
    }
}
