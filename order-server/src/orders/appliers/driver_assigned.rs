//! DriverAssigned event applier
//!
//! Records the claiming driver and moves the order to `ASSIGNED`.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// DriverAssigned applier
pub struct DriverAssignedApplier;

impl EventApplier for DriverAssignedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::DriverAssigned { driver_id } = &event.payload {
            snapshot.driver_id = Some(driver_id.clone());
            snapshot.status = OrderStatus::Assigned;
            snapshot.furthest_status = OrderStatus::Assigned;

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
    fn test_driver_assigned_sets_driver() {
        let mut snapshot = test_order("order-1", OrderStatus::ReadyForPickup);
        let event = event(
            "order-1",
            5,
            Actor::driver("driver-9"),
            EventPayload::DriverAssigned {
                driver_id: "driver-9".to_string(),
            },
        );
        DriverAssignedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.driver_id.as_deref(), Some("driver-9"));
        assert_eq!(snapshot.status, OrderStatus::Assigned);
        assert_eq!(snapshot.last_sequence, 5);
        assert!(snapshot.verify_checksum());
    }
}
