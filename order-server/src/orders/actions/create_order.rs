//! CreateOrder command handler
//!
//! Freezes item prices, checks the monetary decomposition, validates the
//! store and geofence, then authorizes the customer.

use async_trait::async_trait;

use crate::auth::authorize_create;
use crate::geo;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, sum_amounts,
};
use shared::money::Money;
use shared::order::{
    EventPayload, GeoPoint, OrderEvent, OrderEventType, OrderItem, OrderItemInput,
};

/// CreateOrder action
#[derive(Debug, Clone)]
pub struct CreateOrderAction {
    /// Pre-assigned so retries of a failed attempt never reuse an id
    pub order_id: String,
    pub store_id: i64,
    pub items: Vec<OrderItemInput>,
    pub delivery_fee: Money,
    pub delivery_location: GeoPoint,
    pub payment_reference: Option<String>,
    pub expected_total: Option<Money>,
}

impl CreateOrderAction {
    fn freeze_items(&self) -> Result<Vec<OrderItem>, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidInput("order has no items".to_string()));
        }
        self.items
            .iter()
            .map(|input| {
                if input.quantity <= 0 {
                    return Err(OrderError::InvalidInput(format!(
                        "quantity for product {} must be positive",
                        input.product_id
                    )));
                }
                if input.price.is_negative() || input.markup.is_negative() {
                    return Err(OrderError::InvalidAmount(format!(
                        "negative price for product {}",
                        input.product_id
                    )));
                }
                Ok(OrderItem {
                    product_id: input.product_id,
                    name: input.name.clone(),
                    quantity: input.quantity,
                    price_at_time: input.price,
                    markup_at_time: input.markup,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommandHandler for CreateOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Amounts
        let items = self.freeze_items()?;
        if self.delivery_fee.is_negative() {
            return Err(OrderError::InvalidAmount(
                "delivery fee must not be negative".to_string(),
            ));
        }
        let overflow = || OrderError::InvalidAmount("order amount out of range".to_string());
        let base_amount = sum_amounts(items.iter().map(OrderItem::base_total)).ok_or_else(overflow)?;
        let markup_amount =
            sum_amounts(items.iter().map(OrderItem::markup_total)).ok_or_else(overflow)?;
        let total_amount = Money::checked_sum([base_amount, markup_amount, self.delivery_fee])
            .ok_or_else(overflow)?;

        if let Some(expected) = self.expected_total
            && expected != total_amount
        {
            return Err(OrderError::InvalidAmount(format!(
                "declared total {expected} != base {base_amount} + markup {markup_amount} + delivery {}",
                self.delivery_fee
            )));
        }

        // 2. Store and geofence
        let store = ctx.load_store(self.store_id)?;
        if !store.accepts_orders() {
            return Err(OrderError::StoreUnavailable(self.store_id));
        }
        geo::validate(
            &store.location,
            store.service_radius_m,
            &self.delivery_location,
        )?;

        // 3. Caller
        authorize_create(&metadata.actor, &metadata.actor.id)
            .into_result()
            .map_err(OrderError::Unauthorized)?;

        // 4. Payment reference is single-use, and mandatory when accept waits on it
        let require_payment = ctx.config().require_payment_before_accept;
        if require_payment && self.payment_reference.is_none() {
            return Err(OrderError::InvalidInput(
                "payment reference is required before the order can be accepted".to_string(),
            ));
        }
        if let Some(reference) = &self.payment_reference {
            if reference.trim().is_empty() {
                return Err(OrderError::InvalidInput(
                    "payment reference must not be blank".to_string(),
                ));
            }
            if ctx
                .storage()
                .find_order_by_payment_reference_txn(ctx.txn(), reference)?
                .is_some()
            {
                return Err(OrderError::InvalidInput(format!(
                    "payment reference {reference} is already in use"
                )));
            }
            ctx.storage()
                .index_payment_reference(ctx.txn(), reference, &self.order_id)?;
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::OrderCreated,
            EventPayload::OrderCreated {
                customer_id: metadata.actor.id.clone(),
                store_id: self.store_id,
                items,
                base_amount,
                markup_amount,
                delivery_fee: self.delivery_fee,
                total_amount,
                delivery_location: self.delivery_location,
                payment_reference: self.payment_reference.clone(),
                require_payment_before_accept: require_payment,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::geo::GeofenceError;
    use crate::orders::storage::OrderStorage;
    use crate::orders::testing::{metadata, seed_store};
    use shared::order::Actor;

    fn item(price: i64, markup: i64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: 1,
            name: "Jollof rice".to_string(),
            quantity,
            price: Money::from_minor(price),
            markup: Money::from_minor(markup),
        }
    }

    fn action(items: Vec<OrderItemInput>, location: GeoPoint) -> CreateOrderAction {
        CreateOrderAction {
            order_id: "order-1".to_string(),
            store_id: 1,
            items,
            delivery_fee: Money::from_minor(800),
            delivery_location: location,
            payment_reference: None,
            expected_total: None,
        }
    }

    #[tokio::test]
    async fn test_create_decomposes_total() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let mut action = action(vec![item(4000, 600, 2)], GeoPoint::new(0.01, 0.01));
        action.expected_total = Some(Money::from_minor(10000));
        let events = action
            .execute(&mut ctx, &metadata(Actor::customer("customer-1")))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0].payload {
            EventPayload::OrderCreated {
                customer_id,
                base_amount,
                markup_amount,
                total_amount,
                ..
            } => {
                assert_eq!(customer_id, "customer-1");
                assert_eq!(*base_amount, Money::from_minor(8000));
                assert_eq!(*markup_amount, Money::from_minor(1200));
                assert_eq!(*total_amount, Money::from_minor(10000));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_declared_total_mismatch_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let mut action = action(vec![item(4000, 600, 2)], GeoPoint::new(0.01, 0.01));
        action.expected_total = Some(Money::from_minor(9999));
        let result = action
            .execute(&mut ctx, &metadata(Actor::customer("customer-1")))
            .await;
        assert!(matches!(result, Err(OrderError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_too_far_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        // ~55 km north of the store at (0, 0)
        let action = action(vec![item(4000, 600, 2)], GeoPoint::new(0.4946, 0.0));
        let result = action
            .execute(&mut ctx, &metadata(Actor::customer("customer-1")))
            .await;
        assert!(matches!(
            result,
            Err(OrderError::Geofence(GeofenceError::TooFar { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_items_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);
        let meta = metadata(Actor::customer("customer-1"));
        let here = GeoPoint::new(0.0, 0.0);

        assert!(matches!(
            action(vec![], here).execute(&mut ctx, &meta).await,
            Err(OrderError::InvalidInput(_))
        ));
        assert!(matches!(
            action(vec![item(100, 0, 0)], here).execute(&mut ctx, &meta).await,
            Err(OrderError::InvalidInput(_))
        ));
        assert!(matches!(
            action(vec![item(-100, 0, 1)], here).execute(&mut ctx, &meta).await,
            Err(OrderError::InvalidAmount(_))
        ));
        assert!(matches!(
            action(vec![item(i64::MAX, 0, 2)], here).execute(&mut ctx, &meta).await,
            Err(OrderError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_only_customers_create() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let result = action(vec![item(100, 0, 1)], GeoPoint::new(0.0, 0.0))
            .execute(&mut ctx, &metadata(Actor::driver("driver-1")))
            .await;
        assert!(matches!(result, Err(OrderError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_required_payment_needs_reference() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed_store(&storage, 1, "merchant-1");
        let config = EngineConfig {
            require_payment_before_accept: true,
            ..EngineConfig::default()
        };
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);
        let meta = metadata(Actor::customer("customer-1"));

        let mut unpaid = action(vec![item(4000, 600, 2)], GeoPoint::new(0.01, 0.01));
        assert!(matches!(
            unpaid.execute(&mut ctx, &meta).await,
            Err(OrderError::InvalidInput(_))
        ));

        unpaid.payment_reference = Some("R-1".to_string());
        let events = unpaid.execute(&mut ctx, &meta).await.unwrap();
        match &events[0].payload {
            EventPayload::OrderCreated {
                require_payment_before_accept,
                ..
            } => assert!(*require_payment_before_accept),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_store_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &config, 0);

        let result = action(vec![item(100, 0, 1)], GeoPoint::new(0.0, 0.0))
            .execute(&mut ctx, &metadata(Actor::customer("customer-1")))
            .await;
        assert!(matches!(result, Err(OrderError::StoreNotFound(1))));
    }
}
