//! MarkDelivered command handler
//!
//! Entering `DELIVERED` credits the store in the same transaction, unless
//! the payment already failed or was refunded. A ledger failure fails the
//! command and nothing is committed.

use async_trait::async_trait;

use crate::auth::RequestedTransition;
use crate::orders::ledger::{LedgerAccountant, PostingKind};
use crate::orders::state_machine::begin_transition;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType};

/// MarkDelivered action
#[derive(Debug, Clone)]
pub struct MarkDeliveredAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for MarkDeliveredAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let (order, _store) = begin_transition(
            ctx,
            metadata,
            &self.order_id,
            RequestedTransition::MarkDelivered,
        )?;

        let entries = LedgerAccountant::new(ctx.storage(), ctx.config()).post(
            ctx.txn(),
            &order,
            PostingKind::Delivered,
        )?;

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::OrderDelivered,
            EventPayload::OrderDelivered {
                ledger_entry_ids: entries.iter().map(|e| e.entry_id).collect(),
            },
        );

        Ok(vec![event])
    }
}
