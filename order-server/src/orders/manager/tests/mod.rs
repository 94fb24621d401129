use super::*;
use shared::order::{
    CommandErrorCode, GeoPoint, OrderCommandPayload, OrderItemInput, OrderStatus, PaymentStatus,
};

mod test_flows;

/// Store 1 in central Lagos, owned by merchant-1
const STORE_LOCATION: GeoPoint = GeoPoint {
    lat: 6.5244,
    lng: 3.3792,
};

/// A few kilometres from the store
const NEARBY: GeoPoint = GeoPoint {
    lat: 6.5500,
    lng: 3.3500,
};

fn create_test_manager() -> OrdersManager {
    create_test_manager_with(EngineConfig::default())
}

fn create_test_manager_with(config: EngineConfig) -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    let manager = OrdersManager::with_storage(storage, config);
    manager
        .upsert_store(1, store_upsert("merchant-1", None))
        .unwrap();
    manager
}

fn store_upsert(owner_id: &str, radius_m: Option<f64>) -> StoreUpsert {
    StoreUpsert {
        name: "Mama Put".to_string(),
        owner_id: owner_id.to_string(),
        is_verified: true,
        is_open: true,
        location: STORE_LOCATION,
        service_radius_m: radius_m,
    }
}

fn customer() -> Actor {
    Actor::customer("customer-1")
}

fn merchant() -> Actor {
    Actor::merchant("merchant-1")
}

fn driver() -> Actor {
    Actor::driver("driver-1")
}

fn simple_item(product_id: i64, price: i64, markup: i64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id,
        name: format!("Product {product_id}"),
        quantity,
        price: Money::from_minor(price),
        markup: Money::from_minor(markup),
    }
}

/// 2 × (40.00 + 6.00) + 8.00 delivery = 100.00
fn create_order_payload(payment_reference: Option<&str>) -> OrderCommandPayload {
    OrderCommandPayload::CreateOrder {
        store_id: 1,
        items: vec![simple_item(1, 4000, 600, 2)],
        delivery_fee: Money::from_minor(800),
        delivery_location: NEARBY,
        payment_reference: payment_reference.map(str::to_string),
        expected_total: Some(Money::from_minor(10000)),
    }
}

fn run(manager: &OrdersManager, actor: Actor, payload: OrderCommandPayload) -> CommandResponse {
    manager.execute_command(OrderCommand::new(actor, payload))
}

fn assert_rejected(response: &CommandResponse, code: CommandErrorCode) {
    assert!(!response.success, "expected {code:?}, command succeeded");
    assert_eq!(response.error_code(), Some(&code), "{:?}", response.error);
}

fn place_order(manager: &OrdersManager, payment_reference: Option<&str>) -> String {
    let response = run(manager, customer(), create_order_payload(payment_reference));
    assert!(response.success, "create failed: {:?}", response.error);
    response.order_id.unwrap()
}

/// Drive an order forward along the happy path until it reaches `target`
fn advance_to(manager: &OrdersManager, order_id: &str, target: OrderStatus) {
    let id = || order_id.to_string();
    let steps: [(OrderStatus, Actor, OrderCommandPayload); 6] = [
        (
            OrderStatus::Accepted,
            merchant(),
            OrderCommandPayload::AcceptOrder { order_id: id() },
        ),
        (
            OrderStatus::Preparing,
            merchant(),
            OrderCommandPayload::StartPreparing { order_id: id() },
        ),
        (
            OrderStatus::ReadyForPickup,
            merchant(),
            OrderCommandPayload::MarkReadyForPickup { order_id: id() },
        ),
        (
            OrderStatus::Assigned,
            driver(),
            OrderCommandPayload::AcceptDelivery { order_id: id() },
        ),
        (
            OrderStatus::OutForDelivery,
            driver(),
            OrderCommandPayload::PickUpOrder { order_id: id() },
        ),
        (
            OrderStatus::Delivered,
            driver(),
            OrderCommandPayload::MarkDelivered { order_id: id() },
        ),
    ];
    for (reached, actor, payload) in steps {
        let response = run(manager, actor, payload);
        assert!(response.success, "step to {reached} failed: {:?}", response.error);
        if reached == target {
            return;
        }
    }
}

fn register_reason(manager: &OrdersManager, text: &str) -> i64 {
    manager.register_cancellation_reason(text).unwrap().id
}

fn cancel_payload(order_id: &str, reason_id: i64) -> OrderCommandPayload {
    OrderCommandPayload::CancelOrder {
        order_id: order_id.to_string(),
        reason_id,
        note: None,
    }
}

fn reconcile_payload(
    order_id: &str,
    reference: &str,
    status: PaymentStatus,
    amount: i64,
) -> OrderCommandPayload {
    OrderCommandPayload::ReconcilePayment {
        order_id: order_id.to_string(),
        gateway_reference: reference.to_string(),
        status,
        amount: Money::from_minor(amount),
    }
}

fn balance(manager: &OrdersManager) -> Money {
    manager.get_store(1).unwrap().unwrap().ledger_balance
}

fn all_entries(manager: &OrdersManager) -> Vec<StoreLedgerEntry> {
    manager.list_ledger_entries(1, i64::MIN, i64::MAX).unwrap()
}
