//! Order mutation policy
//!
//! An allow-list keyed on (actor role, requested transition). A pair with no
//! rule is denied with [`DenyReason::Forbidden`]. Rules only look at the
//! snapshot and store handed in, so callers evaluate them on state loaded
//! inside the same write transaction as the mutation.

use serde::Serialize;
use shared::models::Store;
use shared::order::{Actor, ActorRole, OrderSnapshot, OrderStatus, PaymentStatus};
use std::fmt;

/// Mutation an actor asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedTransition {
    Create,
    Accept,
    Reject,
    StartPreparing,
    MarkReady,
    AcceptDelivery,
    PickUp,
    MarkDelivered,
    Cancel,
    UpdatePaymentStatus,
}

impl RequestedTransition {
    /// Order status this transition moves to, `None` if status is untouched
    pub fn target(self) -> Option<OrderStatus> {
        match self {
            RequestedTransition::Create => Some(OrderStatus::Pending),
            RequestedTransition::Accept => Some(OrderStatus::Accepted),
            RequestedTransition::Reject | RequestedTransition::Cancel => {
                Some(OrderStatus::Cancelled)
            }
            RequestedTransition::StartPreparing => Some(OrderStatus::Preparing),
            RequestedTransition::MarkReady => Some(OrderStatus::ReadyForPickup),
            RequestedTransition::AcceptDelivery => Some(OrderStatus::Assigned),
            RequestedTransition::PickUp => Some(OrderStatus::OutForDelivery),
            RequestedTransition::MarkDelivered => Some(OrderStatus::Delivered),
            RequestedTransition::UpdatePaymentStatus => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    Forbidden,
    NotOrderCustomer,
    NotStoreOwner,
    NotAssignedDriver,
    DriverAlreadyAssigned,
    StatusNotAllowed,
    PaymentRequired,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DenyReason::Forbidden => "role may not perform this transition",
            DenyReason::NotOrderCustomer => "actor is not the order's customer",
            DenyReason::NotStoreOwner => "actor does not own the order's store",
            DenyReason::NotAssignedDriver => "actor is not the assigned driver",
            DenyReason::DriverAlreadyAssigned => "a driver is already assigned",
            DenyReason::StatusNotAllowed => "not allowed in the current status",
            DenyReason::PaymentRequired => "payment must be charged first",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_permit(self) -> bool {
        self == Decision::Permit
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Permit => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Checks run in order; the first failing one is the deny reason.
fn require(checks: &[(bool, DenyReason)]) -> Decision {
    checks
        .iter()
        .find(|(ok, _)| !ok)
        .map(|(_, reason)| Decision::Deny(*reason))
        .unwrap_or(Decision::Permit)
}

/// A customer may only place orders for themselves
pub fn authorize_create(actor: &Actor, customer_id: &str) -> Decision {
    match actor.role {
        ActorRole::Customer => require(&[(actor.id == customer_id, DenyReason::NotOrderCustomer)]),
        _ => Decision::Deny(DenyReason::Forbidden),
    }
}

pub fn authorize(
    actor: &Actor,
    order: &OrderSnapshot,
    store: &Store,
    requested: RequestedTransition,
) -> Decision {
    use OrderStatus as S;
    use RequestedTransition as T;

    let status = order.status;
    let is_customer = order.customer_id == actor.id;
    let owns_store = store.owner_id == actor.id;
    let is_driver = order.driver_id.as_deref() == Some(actor.id.as_str());

    match (actor.role, requested) {
        (ActorRole::Customer, T::Create) => authorize_create(actor, &order.customer_id),
        (ActorRole::Customer, T::Cancel) => require(&[
            (
                matches!(status, S::Pending | S::Accepted),
                DenyReason::StatusNotAllowed,
            ),
            (is_customer, DenyReason::NotOrderCustomer),
        ]),

        (ActorRole::Merchant, T::Accept) => require(&[
            (status == S::Pending, DenyReason::StatusNotAllowed),
            (owns_store, DenyReason::NotStoreOwner),
            (
                !order.require_payment_before_accept
                    || order.payment_status == PaymentStatus::Charged,
                DenyReason::PaymentRequired,
            ),
        ]),
        (ActorRole::Merchant, T::Reject) => require(&[
            (status == S::Pending, DenyReason::StatusNotAllowed),
            (owns_store, DenyReason::NotStoreOwner),
        ]),
        (ActorRole::Merchant, T::StartPreparing) => require(&[
            (status == S::Accepted, DenyReason::StatusNotAllowed),
            (owns_store, DenyReason::NotStoreOwner),
        ]),
        (ActorRole::Merchant, T::MarkReady) => require(&[
            (status == S::Preparing, DenyReason::StatusNotAllowed),
            (owns_store, DenyReason::NotStoreOwner),
        ]),
        (ActorRole::Merchant, T::Cancel) => require(&[
            (
                matches!(status, S::Pending | S::Accepted | S::Preparing),
                DenyReason::StatusNotAllowed,
            ),
            (owns_store, DenyReason::NotStoreOwner),
        ]),

        (ActorRole::Driver, T::AcceptDelivery) => require(&[
            (status == S::ReadyForPickup, DenyReason::StatusNotAllowed),
            (order.driver_id.is_none(), DenyReason::DriverAlreadyAssigned),
        ]),
        (ActorRole::Driver, T::PickUp) => require(&[
            (status == S::Assigned, DenyReason::StatusNotAllowed),
            (is_driver, DenyReason::NotAssignedDriver),
        ]),
        (ActorRole::Driver, T::MarkDelivered) => require(&[
            (status == S::OutForDelivery, DenyReason::StatusNotAllowed),
            (is_driver, DenyReason::NotAssignedDriver),
        ]),
        (ActorRole::Driver, T::Cancel) => require(&[
            (
                matches!(status, S::Assigned | S::OutForDelivery),
                DenyReason::StatusNotAllowed,
            ),
            (is_driver, DenyReason::NotAssignedDriver),
        ]),

        (ActorRole::System, T::UpdatePaymentStatus) => Decision::Permit,
        (ActorRole::System, T::Cancel) => {
            require(&[(!status.is_terminal(), DenyReason::StatusNotAllowed)])
        }

        _ => Decision::Deny(DenyReason::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::GeoPoint;

    fn store() -> Store {
        Store {
            store_id: 1,
            name: "Test Store".to_string(),
            owner_id: "merchant-1".to_string(),
            is_verified: true,
            is_open: true,
            location: GeoPoint::new(0.0, 0.0),
            service_radius_m: 30_000.0,
            ledger_balance: Default::default(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn order(status: OrderStatus) -> OrderSnapshot {
        let mut order = OrderSnapshot::new("order-1".to_string());
        order.customer_id = "customer-1".to_string();
        order.store_id = 1;
        order.status = status;
        order
    }

    fn assigned(status: OrderStatus, driver: &str) -> OrderSnapshot {
        let mut order = order(status);
        order.driver_id = Some(driver.to_string());
        order
    }

    #[test]
    fn test_customer_creates_only_as_self() {
        let actor = Actor::customer("customer-1");
        assert!(authorize_create(&actor, "customer-1").is_permit());
        assert_eq!(
            authorize_create(&actor, "customer-2"),
            Decision::Deny(DenyReason::NotOrderCustomer)
        );
        assert_eq!(
            authorize_create(&Actor::merchant("merchant-1"), "merchant-1"),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[test]
    fn test_customer_cancel_window() {
        let actor = Actor::customer("customer-1");
        let s = store();
        for status in [OrderStatus::Pending, OrderStatus::Accepted] {
            assert!(authorize(&actor, &order(status), &s, RequestedTransition::Cancel).is_permit());
        }
        assert_eq!(
            authorize(&actor, &order(OrderStatus::Preparing), &s, RequestedTransition::Cancel),
            Decision::Deny(DenyReason::StatusNotAllowed)
        );
        assert_eq!(
            authorize(
                &Actor::customer("customer-2"),
                &order(OrderStatus::Pending),
                &s,
                RequestedTransition::Cancel
            ),
            Decision::Deny(DenyReason::NotOrderCustomer)
        );
    }

    #[test]
    fn test_merchant_must_own_store() {
        let s = store();
        let pending = order(OrderStatus::Pending);
        assert!(authorize(&Actor::merchant("merchant-1"), &pending, &s, RequestedTransition::Accept)
            .is_permit());
        assert_eq!(
            authorize(&Actor::merchant("merchant-2"), &pending, &s, RequestedTransition::Accept),
            Decision::Deny(DenyReason::NotStoreOwner)
        );
        assert_eq!(
            authorize(&Actor::merchant("merchant-2"), &pending, &s, RequestedTransition::Reject),
            Decision::Deny(DenyReason::NotStoreOwner)
        );
    }

    #[test]
    fn test_merchant_accept_waits_for_payment_when_required() {
        let s = store();
        let merchant = Actor::merchant("merchant-1");
        let mut pending = order(OrderStatus::Pending);
        pending.require_payment_before_accept = true;

        assert_eq!(
            authorize(&merchant, &pending, &s, RequestedTransition::Accept),
            Decision::Deny(DenyReason::PaymentRequired)
        );

        pending.payment_status = PaymentStatus::Charged;
        assert!(authorize(&merchant, &pending, &s, RequestedTransition::Accept).is_permit());
    }

    #[test]
    fn test_merchant_cannot_cancel_after_handover() {
        let s = store();
        let merchant = Actor::merchant("merchant-1");
        assert!(authorize(&merchant, &order(OrderStatus::Preparing), &s, RequestedTransition::Cancel)
            .is_permit());
        assert_eq!(
            authorize(
                &merchant,
                &order(OrderStatus::ReadyForPickup),
                &s,
                RequestedTransition::Cancel
            ),
            Decision::Deny(DenyReason::StatusNotAllowed)
        );
    }

    #[test]
    fn test_driver_claim_requires_unassigned_order() {
        let s = store();
        let driver = Actor::driver("driver-1");
        assert!(authorize(
            &driver,
            &order(OrderStatus::ReadyForPickup),
            &s,
            RequestedTransition::AcceptDelivery
        )
        .is_permit());
        assert_eq!(
            authorize(
                &driver,
                &assigned(OrderStatus::ReadyForPickup, "driver-2"),
                &s,
                RequestedTransition::AcceptDelivery
            ),
            Decision::Deny(DenyReason::DriverAlreadyAssigned)
        );
    }

    #[test]
    fn test_only_assigned_driver_progresses() {
        let s = store();
        let out = assigned(OrderStatus::OutForDelivery, "driver-1");
        assert!(authorize(&Actor::driver("driver-1"), &out, &s, RequestedTransition::MarkDelivered)
            .is_permit());
        assert_eq!(
            authorize(&Actor::driver("driver-2"), &out, &s, RequestedTransition::MarkDelivered),
            Decision::Deny(DenyReason::NotAssignedDriver)
        );
        assert_eq!(
            authorize(&Actor::driver("driver-2"), &out, &s, RequestedTransition::Cancel),
            Decision::Deny(DenyReason::NotAssignedDriver)
        );
        assert!(authorize(
            &Actor::driver("driver-1"),
            &assigned(OrderStatus::Assigned, "driver-1"),
            &s,
            RequestedTransition::PickUp
        )
        .is_permit());
    }

    #[test]
    fn test_system_only_touches_payment_or_cancels() {
        let s = store();
        let system = Actor::system();
        let accepted = order(OrderStatus::Accepted);
        assert!(authorize(&system, &accepted, &s, RequestedTransition::UpdatePaymentStatus).is_permit());
        assert!(authorize(&system, &accepted, &s, RequestedTransition::Cancel).is_permit());
        assert_eq!(
            authorize(&system, &accepted, &s, RequestedTransition::StartPreparing),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[test]
    fn test_unlisted_pairs_are_forbidden() {
        let s = store();
        let pending = order(OrderStatus::Pending);
        for (actor, transition) in [
            (Actor::customer("customer-1"), RequestedTransition::Accept),
            (Actor::customer("customer-1"), RequestedTransition::UpdatePaymentStatus),
            (Actor::driver("driver-1"), RequestedTransition::Accept),
            (Actor::merchant("merchant-1"), RequestedTransition::MarkDelivered),
            (Actor::merchant("merchant-1"), RequestedTransition::UpdatePaymentStatus),
        ] {
            assert_eq!(
                authorize(&actor, &pending, &s, transition),
                Decision::Deny(DenyReason::Forbidden),
                "{:?} {:?}",
                actor.role,
                transition
            );
        }
    }

    #[test]
    fn test_transition_targets() {
        assert_eq!(RequestedTransition::Reject.target(), Some(OrderStatus::Cancelled));
        assert_eq!(RequestedTransition::PickUp.target(), Some(OrderStatus::OutForDelivery));
        assert_eq!(RequestedTransition::UpdatePaymentStatus.target(), None);
    }
}
