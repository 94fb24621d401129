//! AcceptDelivery command handler
//!
//! A driver claims a ready order. The claim and the move to `ASSIGNED` are
//! one event, so two drivers racing for the same order cannot both win.

use async_trait::async_trait;

use crate::auth::RequestedTransition;
use crate::orders::state_machine::begin_transition;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType};

/// AcceptDelivery action
#[derive(Debug, Clone)]
pub struct AcceptDeliveryAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for AcceptDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        begin_transition(
            ctx,
            metadata,
            &self.order_id,
            RequestedTransition::AcceptDelivery,
        )?;

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::DriverAssigned,
            EventPayload::DriverAssigned {
                driver_id: metadata.actor.id.clone(),
            },
        );

        Ok(vec![event])
    }
}
