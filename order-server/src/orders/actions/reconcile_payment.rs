//! ReconcilePayment command handler
//!
//! Applies a gateway outcome to the payment axis. Order status is never
//! touched, and terminal orders are accepted (a cancelled order can still
//! be refunded). Re-delivering the current status is a no-op.

use async_trait::async_trait;

use crate::auth::{RequestedTransition, authorize};
use crate::orders::ledger::{LedgerAccountant, PostingKind};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::payment::ReconciliationError;
use shared::money::Money;
use shared::order::{EventPayload, OrderEvent, OrderEventType, PaymentStatus};

/// ReconcilePayment action
#[derive(Debug, Clone)]
pub struct ReconcilePaymentAction {
    pub order_id: String,
    pub gateway_reference: String,
    pub status: PaymentStatus,
    pub amount: Money,
}

#[async_trait]
impl CommandHandler for ReconcilePaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        let store = ctx.load_store(order.store_id)?;
        authorize(
            &metadata.actor,
            &order,
            &store,
            RequestedTransition::UpdatePaymentStatus,
        )
        .into_result()
        .map_err(OrderError::Unauthorized)?;

        if order.payment_reference.as_deref() != Some(self.gateway_reference.as_str()) {
            return Err(ReconciliationError::ReferenceMismatch {
                expected: order.payment_reference.clone(),
                received: self.gateway_reference.clone(),
            }
            .into());
        }

        if self.status == PaymentStatus::Charged && self.amount != order.total_amount {
            return Err(ReconciliationError::AmountMismatch {
                expected: order.total_amount,
                received: self.amount,
            }
            .into());
        }

        if self.status == order.payment_status {
            tracing::debug!(
                order_id = %self.order_id,
                status = %self.status,
                "Payment status already applied"
            );
            return Ok(vec![]);
        }

        if !order.payment_status.can_advance_to(self.status) {
            return Err(ReconciliationError::AlreadyFinal {
                from: order.payment_status,
                to: self.status,
            }
            .into());
        }

        let entries = if self.status == PaymentStatus::Refunded {
            LedgerAccountant::new(ctx.storage(), ctx.config()).post(
                ctx.txn(),
                &order,
                PostingKind::Refunded,
            )?
        } else {
            vec![]
        };

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::PaymentStatusChanged,
            EventPayload::PaymentStatusChanged {
                from: order.payment_status,
                to: self.status,
                gateway_reference: self.gateway_reference.clone(),
                amount: self.amount,
                ledger_entry_ids: entries.iter().map(|e| e.entry_id).collect(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::orders::storage::OrderStorage;
    use crate::orders::testing::{metadata, seed_order, seed_store, test_order};
    use shared::order::{Actor, OrderSnapshot, OrderStatus};

    fn paid_order(status: OrderStatus, payment: PaymentStatus) -> OrderSnapshot {
        let mut order = test_order("order-1", status);
        order.payment_reference = Some("R-1".to_string());
        order.payment_status = payment;
        order
    }

    fn reconcile(status: PaymentStatus, amount: i64) -> ReconcilePaymentAction {
        ReconcilePaymentAction {
            order_id: "order-1".to_string(),
            gateway_reference: "R-1".to_string(),
            status,
            amount: Money::from_minor(amount),
        }
    }

    #[tokio::test]
    async fn test_charge_recorded() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Pending, PaymentStatus::Pending));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let events = reconcile(PaymentStatus::Charged, 10000)
            .execute(&mut ctx, &metadata(Actor::system()))
            .await
            .unwrap();
        assert!(matches!(
            events[0].payload,
            EventPayload::PaymentStatusChanged {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Charged,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Accepted, PaymentStatus::Charged));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let events = reconcile(PaymentStatus::Charged, 10000)
            .execute(&mut ctx, &metadata(Actor::system()))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_reference_mismatch() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Pending, PaymentStatus::Pending));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let mut action = reconcile(PaymentStatus::Charged, 10000);
        action.gateway_reference = "R-forged".to_string();
        let result = action.execute(&mut ctx, &metadata(Actor::system())).await;
        assert!(matches!(
            result,
            Err(OrderError::Reconciliation(
                ReconciliationError::ReferenceMismatch { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_amount_mismatch_on_charge() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Pending, PaymentStatus::Pending));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let result = reconcile(PaymentStatus::Charged, 9000)
            .execute(&mut ctx, &metadata(Actor::system()))
            .await;
        assert!(matches!(
            result,
            Err(OrderError::Reconciliation(
                ReconciliationError::AmountMismatch { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_backward_move_is_already_final() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Accepted, PaymentStatus::Refunded));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let result = reconcile(PaymentStatus::Charged, 10000)
            .execute(&mut ctx, &metadata(Actor::system()))
            .await;
        assert!(matches!(
            result,
            Err(OrderError::Reconciliation(
                ReconciliationError::AlreadyFinal { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_only_system_reconciles() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Pending, PaymentStatus::Pending));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let result = reconcile(PaymentStatus::Charged, 10000)
            .execute(&mut ctx, &metadata(Actor::customer("customer-1")))
            .await;
        assert!(matches!(result, Err(OrderError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refund_of_cancelled_order_posts_nothing() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        seed_order(&storage, &paid_order(OrderStatus::Cancelled, PaymentStatus::Charged));
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let events = reconcile(PaymentStatus::Refunded, 10000)
            .execute(&mut ctx, &metadata(Actor::system()))
            .await
            .unwrap();
        match &events[0].payload {
            EventPayload::PaymentStatusChanged {
                ledger_entry_ids, ..
            } => assert!(ledger_entry_ids.is_empty()),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
