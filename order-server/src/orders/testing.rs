//! Fixtures shared by action, applier and manager tests

use shared::models::Store;
use shared::money::Money;
use shared::order::{
    Actor, EventPayload, GeoPoint, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
};

use super::storage::OrderStorage;
use super::traits::CommandMetadata;

pub fn metadata(actor: Actor) -> CommandMetadata {
    CommandMetadata {
        command_id: uuid::Uuid::new_v4().to_string(),
        actor,
        timestamp: Some(1_700_000_000_000),
    }
}

pub fn test_store(store_id: i64, owner_id: &str) -> Store {
    Store {
        store_id,
        name: format!("Store {store_id}"),
        owner_id: owner_id.to_string(),
        is_verified: true,
        is_open: true,
        location: GeoPoint::new(0.0, 0.0),
        service_radius_m: 30_000.0,
        ledger_balance: Money::ZERO,
        created_at: 0,
        updated_at: 0,
    }
}

pub fn seed_store(storage: &OrderStorage, store_id: i64, owner_id: &str) {
    let txn = storage.begin_write().unwrap();
    storage
        .put_store(&txn, &test_store(store_id, owner_id))
        .unwrap();
    txn.commit().unwrap();
}

/// 80.00 + 12.00 + 8.00 order for customer-1 at store 1
pub fn test_order(order_id: &str, status: OrderStatus) -> OrderSnapshot {
    let mut order = OrderSnapshot::new(order_id.to_string());
    order.customer_id = "customer-1".to_string();
    order.store_id = 1;
    order.status = status;
    order.furthest_status = if status == OrderStatus::Cancelled {
        OrderStatus::Pending
    } else {
        status
    };
    order.base_amount = Money::from_minor(8000);
    order.markup_amount = Money::from_minor(1200);
    order.delivery_fee = Money::from_minor(800);
    order.total_amount = Money::from_minor(10000);
    order.update_checksum();
    order
}

pub fn seed_order(storage: &OrderStorage, order: &OrderSnapshot) {
    let txn = storage.begin_write().unwrap();
    storage.store_snapshot(&txn, order).unwrap();
    txn.commit().unwrap();
}

/// Event with a type derived from its payload, as the actions build them
pub fn event(order_id: &str, sequence: u64, actor: Actor, payload: EventPayload) -> OrderEvent {
    let event_type = match &payload {
        EventPayload::OrderCreated { .. } => OrderEventType::OrderCreated,
        EventPayload::StatusAdvanced { .. } => OrderEventType::StatusAdvanced,
        EventPayload::DriverAssigned { .. } => OrderEventType::DriverAssigned,
        EventPayload::OrderDelivered { .. } => OrderEventType::OrderDelivered,
        EventPayload::OrderCancelled { .. } => OrderEventType::OrderCancelled,
        EventPayload::PaymentStatusChanged { .. } => OrderEventType::PaymentStatusChanged,
    };
    OrderEvent::new(
        sequence,
        order_id.to_string(),
        actor,
        format!("cmd-{sequence}"),
        None,
        event_type,
        payload,
    )
}
