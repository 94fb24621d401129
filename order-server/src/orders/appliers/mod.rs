//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions: replaying the
//! same events onto `OrderSnapshot::new` always yields the same snapshot.

use enum_dispatch::enum_dispatch;

use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod driver_assigned;
mod order_cancelled;
mod order_created;
mod order_delivered;
mod payment_status_changed;
mod status_advanced;

pub use driver_assigned::DriverAssignedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_created::OrderCreatedApplier;
pub use order_delivered::OrderDeliveredApplier;
pub use payment_status_changed::PaymentStatusChangedApplier;
pub use status_advanced::StatusAdvancedApplier;

/// Event applier - folds one event into a snapshot
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderCreated(OrderCreatedApplier),
    StatusAdvanced(StatusAdvancedApplier),
    DriverAssigned(DriverAssignedApplier),
    OrderDelivered(OrderDeliveredApplier),
    OrderCancelled(OrderCancelledApplier),
    PaymentStatusChanged(PaymentStatusChangedApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderCreated { .. } => EventAction::OrderCreated(OrderCreatedApplier),
            EventPayload::StatusAdvanced { .. } => {
                EventAction::StatusAdvanced(StatusAdvancedApplier)
            }
            EventPayload::DriverAssigned { .. } => {
                EventAction::DriverAssigned(DriverAssignedApplier)
            }
            EventPayload::OrderDelivered { .. } => {
                EventAction::OrderDelivered(OrderDeliveredApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::PaymentStatusChanged { .. } => {
                EventAction::PaymentStatusChanged(PaymentStatusChangedApplier)
            }
        }
    }
}
