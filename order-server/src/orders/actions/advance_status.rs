//! Happy-path steps with no ledger effect
//!
//! Accept, StartPreparing, MarkReady and PickUp only move the status one
//! step forward, so they share this handler.

use async_trait::async_trait;

use crate::auth::RequestedTransition;
use crate::orders::state_machine::begin_transition;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType};

/// AdvanceStatus action
#[derive(Debug, Clone)]
pub struct AdvanceStatusAction {
    pub order_id: String,
    pub transition: RequestedTransition,
}

#[async_trait]
impl CommandHandler for AdvanceStatusAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let to = match self.transition {
            RequestedTransition::Accept
            | RequestedTransition::StartPreparing
            | RequestedTransition::MarkReady
            | RequestedTransition::PickUp => self.transition.target(),
            _ => None,
        }
        .ok_or_else(|| {
            OrderError::InvalidInput(format!("{:?} is not a plain status step", self.transition))
        })?;

        let (order, _store) = begin_transition(ctx, metadata, &self.order_id, self.transition)?;

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::StatusAdvanced,
            EventPayload::StatusAdvanced {
                from: order.status,
                to,
            },
        );

        Ok(vec![event])
    }
}
