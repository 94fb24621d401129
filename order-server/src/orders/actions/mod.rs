//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one family of commands.

use async_trait::async_trait;

use crate::auth::RequestedTransition;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{OrderCommand, OrderCommandPayload, OrderEvent};

mod accept_delivery;
mod advance_status;
mod cancel_order;
mod create_order;
mod mark_delivered;
mod reconcile_payment;

pub use accept_delivery::AcceptDeliveryAction;
pub use advance_status::AdvanceStatusAction;
pub use cancel_order::CancelOrderAction;
pub use create_order::CreateOrderAction;
pub use mark_delivered::MarkDeliveredAction;
pub use reconcile_payment::ReconcilePaymentAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug)]
pub enum CommandAction {
    CreateOrder(CreateOrderAction),
    AdvanceStatus(AdvanceStatusAction),
    AcceptDelivery(AcceptDeliveryAction),
    MarkDelivered(MarkDeliveredAction),
    CancelOrder(CancelOrderAction),
    ReconcilePayment(ReconcilePaymentAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::CreateOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::AdvanceStatus(action) => action.execute(ctx, metadata).await,
            CommandAction::AcceptDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkDelivered(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::ReconcilePayment(action) => action.execute(ctx, metadata).await,
        }
    }
}

fn step(order_id: &str, transition: RequestedTransition) -> CommandAction {
    CommandAction::AdvanceStatus(AdvanceStatusAction {
        order_id: order_id.to_string(),
        transition,
    })
}

/// Convert OrderCommand to CommandAction
///
/// This is the ONLY place with a match on OrderCommandPayload. New orders
/// get their id here, so a retried create never collides with a failed one.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::CreateOrder {
                store_id,
                items,
                delivery_fee,
                delivery_location,
                payment_reference,
                expected_total,
            } => CommandAction::CreateOrder(CreateOrderAction {
                order_id: uuid::Uuid::new_v4().to_string(),
                store_id: *store_id,
                items: items.clone(),
                delivery_fee: *delivery_fee,
                delivery_location: *delivery_location,
                payment_reference: payment_reference.clone(),
                expected_total: *expected_total,
            }),
            OrderCommandPayload::AcceptOrder { order_id } => {
                step(order_id, RequestedTransition::Accept)
            }
            OrderCommandPayload::StartPreparing { order_id } => {
                step(order_id, RequestedTransition::StartPreparing)
            }
            OrderCommandPayload::MarkReadyForPickup { order_id } => {
                step(order_id, RequestedTransition::MarkReady)
            }
            OrderCommandPayload::PickUpOrder { order_id } => {
                step(order_id, RequestedTransition::PickUp)
            }
            OrderCommandPayload::AcceptDelivery { order_id } => {
                CommandAction::AcceptDelivery(AcceptDeliveryAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::MarkDelivered { order_id } => {
                CommandAction::MarkDelivered(MarkDeliveredAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::RejectOrder {
                order_id,
                reason_id,
                note,
            } => CommandAction::CancelOrder(CancelOrderAction {
                order_id: order_id.clone(),
                reason_id: *reason_id,
                note: note.clone(),
                transition: RequestedTransition::Reject,
            }),
            OrderCommandPayload::CancelOrder {
                order_id,
                reason_id,
                note,
            } => CommandAction::CancelOrder(CancelOrderAction {
                order_id: order_id.clone(),
                reason_id: *reason_id,
                note: note.clone(),
                transition: RequestedTransition::Cancel,
            }),
            OrderCommandPayload::ReconcilePayment {
                order_id,
                gateway_reference,
                status,
                amount,
            } => CommandAction::ReconcilePayment(ReconcilePaymentAction {
                order_id: order_id.clone(),
                gateway_reference: gateway_reference.clone(),
                status: *status,
                amount: *amount,
            }),
        }
    }
}
