use super::*;
use crate::core::CancellationFeePolicy;
use shared::models::LedgerEntryKind;
use shared::order::CancelledBy;

#[test]
fn test_full_delivery_flow_credits_base_amount() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, None);
    advance_to(&manager, &order_id, OrderStatus::Delivered);

    let order = manager.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.driver_id.as_deref(), Some("driver-1"));

    let entries = all_entries(&manager);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerEntryKind::SaleCredit);
    assert_eq!(entries[0].order_id.as_deref(), Some(order_id.as_str()));
    // Markup and delivery fee stay with the platform
    assert_eq!(entries[0].amount, Money::from_minor(8000));
    assert_eq!(balance(&manager), Money::from_minor(8000));
    assert!(manager.verify_store_balance(1).unwrap().is_consistent());
}

#[test]
fn test_customer_cancels_pending_order() {
    let manager = create_test_manager();
    let reason = register_reason(&manager, "Changed my mind");
    let order_id = place_order(&manager, None);

    let response = run(&manager, customer(), cancel_payload(&order_id, reason));
    assert!(response.success);

    let order = manager.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.cancelled_by, Some(CancelledBy::Customer));
    assert!(all_entries(&manager).is_empty());
    assert_eq!(balance(&manager), Money::ZERO);
}

#[test]
fn test_merchant_cancels_accepted_order_pays_fee() {
    let manager = create_test_manager();
    let reason = register_reason(&manager, "Out of stock");
    let order_id = place_order(&manager, None);
    advance_to(&manager, &order_id, OrderStatus::Accepted);

    let response = run(&manager, merchant(), cancel_payload(&order_id, reason));
    assert!(response.success);

    let entries = all_entries(&manager);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerEntryKind::CancellationFee);
    // 10% of the 80.00 base amount
    assert_eq!(entries[0].amount, Money::from_minor(-800));
    assert_eq!(balance(&manager), Money::from_minor(-800));
}

#[test]
fn test_fixed_cancellation_fee() {
    let manager = create_test_manager_with(EngineConfig {
        cancellation_fee: CancellationFeePolicy::Fixed(Money::from_minor(250)),
        ..EngineConfig::default()
    });
    let reason = register_reason(&manager, "Out of stock");
    let order_id = place_order(&manager, None);
    advance_to(&manager, &order_id, OrderStatus::Preparing);

    assert!(run(&manager, merchant(), cancel_payload(&order_id, reason)).success);
    assert_eq!(balance(&manager), Money::from_minor(-250));
}

#[test]
fn test_merchant_reject_has_no_fee() {
    let manager = create_test_manager();
    let reason = register_reason(&manager, "Too busy");
    let order_id = place_order(&manager, None);

    let response = run(
        &manager,
        merchant(),
        OrderCommandPayload::RejectOrder {
            order_id: order_id.clone(),
            reason_id: reason,
            note: Some("Closing early".to_string()),
        },
    );
    assert!(response.success);

    let order = response.order.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.cancelled_by, Some(CancelledBy::Merchant));
    assert_eq!(order.cancellation_note.as_deref(), Some("Closing early"));
    assert!(all_entries(&manager).is_empty());
}

#[test]
fn test_driver_cancel_fee_is_configurable() {
    for (charge, expected) in [(false, Money::ZERO), (true, Money::from_minor(-800))] {
        let manager = create_test_manager_with(EngineConfig {
            charge_store_on_driver_cancel: charge,
            ..EngineConfig::default()
        });
        let reason = register_reason(&manager, "Vehicle breakdown");
        let order_id = place_order(&manager, None);
        advance_to(&manager, &order_id, OrderStatus::Assigned);

        let response = run(&manager, driver(), cancel_payload(&order_id, reason));
        assert!(response.success, "{:?}", response.error);
        assert_eq!(balance(&manager), expected, "charge_store_on_driver_cancel={charge}");
    }
}

#[test]
fn test_system_cancel_uses_sentinel_reason() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, None);
    advance_to(&manager, &order_id, OrderStatus::Accepted);

    let response = run(
        &manager,
        Actor::system(),
        cancel_payload(&order_id, shared::models::SYSTEM_REASON_ID),
    );
    assert!(response.success);
    let order = response.order.unwrap();
    assert_eq!(order.cancelled_by, Some(CancelledBy::System));
    // System cancellation after accept is treated like a merchant failure
    assert_eq!(balance(&manager), Money::from_minor(-800));
}

#[test]
fn test_payment_callback_twice_is_noop() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, Some("R-100"));

    let first = run(
        &manager,
        Actor::system(),
        reconcile_payload(&order_id, "R-100", PaymentStatus::Charged, 10000),
    );
    assert!(first.success);
    let sequence = manager.get_current_sequence().unwrap();

    // Different command id, same gateway outcome
    let second = run(
        &manager,
        Actor::system(),
        reconcile_payload(&order_id, "R-100", PaymentStatus::Charged, 10000),
    );
    assert!(second.success);
    assert_eq!(second.order.unwrap().payment_status, PaymentStatus::Charged);
    assert_eq!(manager.get_current_sequence().unwrap(), sequence);
    assert!(all_entries(&manager).is_empty());
}

#[test]
fn test_payment_required_before_accept() {
    let manager = create_test_manager_with(EngineConfig {
        require_payment_before_accept: true,
        ..EngineConfig::default()
    });
    let order_id = place_order(&manager, Some("R-7"));

    let accept = || OrderCommandPayload::AcceptOrder {
        order_id: order_id.clone(),
    };
    assert_rejected(&run(&manager, merchant(), accept()), CommandErrorCode::Unauthorized);

    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-7", PaymentStatus::Charged, 10000))
            .success
    );
    assert!(run(&manager, merchant(), accept()).success);
}

#[test]
fn test_refund_after_delivery_reverses_sale() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, Some("R-9"));
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-9", PaymentStatus::Charged, 10000))
            .success
    );
    advance_to(&manager, &order_id, OrderStatus::Delivered);

    let refund = reconcile_payload(&order_id, "R-9", PaymentStatus::Refunded, 10000);
    assert!(run(&manager, Actor::system(), refund.clone()).success);
    // Redelivered refund callback
    assert!(run(&manager, Actor::system(), refund).success);

    let entries = all_entries(&manager);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].kind, LedgerEntryKind::Adjustment);
    assert_eq!(entries[1].amount, Money::from_minor(-8000));
    assert_eq!(balance(&manager), Money::ZERO);

    let order = manager.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.payment_status, PaymentStatus::Refunded);
}

#[test]
fn test_refund_of_cancelled_order() {
    let manager = create_test_manager();
    let reason = register_reason(&manager, "Changed my mind");
    let order_id = place_order(&manager, Some("R-5"));
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-5", PaymentStatus::Charged, 10000))
            .success
    );
    assert!(run(&manager, customer(), cancel_payload(&order_id, reason)).success);

    let response = run(
        &manager,
        Actor::system(),
        reconcile_payload(&order_id, "R-5", PaymentStatus::Refunded, 10000),
    );
    assert!(response.success);
    assert_eq!(response.order.unwrap().payment_status, PaymentStatus::Refunded);
    assert!(all_entries(&manager).is_empty());
}

#[test]
fn test_refund_before_delivery_leaves_store_uncredited() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, Some("R-7"));
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-7", PaymentStatus::Charged, 10000))
            .success
    );
    advance_to(&manager, &order_id, OrderStatus::OutForDelivery);
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-7", PaymentStatus::Refunded, 10000))
            .success
    );

    let response = run(
        &manager,
        driver(),
        OrderCommandPayload::MarkDelivered {
            order_id: order_id.clone(),
        },
    );
    assert!(response.success, "{:?}", response.error);
    let order = response.order.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.payment_status, PaymentStatus::Refunded);

    assert!(all_entries(&manager).is_empty());
    assert_eq!(balance(&manager), Money::ZERO);
    assert!(manager.verify_store_balance(1).unwrap().is_consistent());
}

#[test]
fn test_failed_payment_delivery_not_credited() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, Some("R-8"));
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-8", PaymentStatus::Failed, 10000))
            .success
    );
    advance_to(&manager, &order_id, OrderStatus::Delivered);

    let order = manager.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert!(all_entries(&manager).is_empty());

    // A later reversal has no sale credit to undo
    assert!(
        run(&manager, Actor::system(), reconcile_payload(&order_id, "R-8", PaymentStatus::Refunded, 10000))
            .success
    );
    assert!(all_entries(&manager).is_empty());
    assert_eq!(balance(&manager), Money::ZERO);
}

#[test]
fn test_payout_and_adjustment_keep_balance_consistent() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, None);
    advance_to(&manager, &order_id, OrderStatus::Delivered);

    let payout = manager
        .record_payout(&Actor::system(), 1, Money::from_minor(5000), None)
        .unwrap();
    assert_eq!(payout.kind, LedgerEntryKind::PayoutDebit);
    assert_eq!(payout.amount, Money::from_minor(-5000));

    manager
        .post_adjustment(
            &Actor::system(),
            1,
            Some(order_id),
            Money::from_minor(150),
            "Packaging reimbursement",
        )
        .unwrap();

    assert_eq!(balance(&manager), Money::from_minor(3150));
    let check = manager.verify_store_balance(1).unwrap();
    assert!(check.is_consistent());
    assert_eq!(check.computed, Money::from_minor(3150));
}
