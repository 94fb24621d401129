//! CancelOrder / RejectOrder command handler
//!
//! A merchant reject is a cancellation of a pending order. Both record the
//! acting role as `cancelled_by`, require a catalog reason and may charge
//! the store a cancellation fee.

use async_trait::async_trait;

use crate::auth::RequestedTransition;
use crate::orders::ledger::{LedgerAccountant, PostingKind};
use crate::orders::reasons::ReasonCatalog;
use crate::orders::state_machine::begin_transition;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{CancelledBy, EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// Longest accepted free-text note, in characters
const MAX_NOTE_LEN: usize = 500;

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason_id: i64,
    pub note: Option<String>,
    /// `Cancel` or `Reject`
    pub transition: RequestedTransition,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !matches!(
            self.transition,
            RequestedTransition::Cancel | RequestedTransition::Reject
        ) {
            return Err(OrderError::InvalidInput(format!(
                "{:?} is not a cancellation",
                self.transition
            )));
        }

        // 1. State + policy
        let (order, _store) = begin_transition(ctx, metadata, &self.order_id, self.transition)?;

        // 2. Reason
        let cancelled_by = CancelledBy::from(metadata.actor.role);
        ReasonCatalog::new(ctx.storage()).require_valid(ctx.txn(), self.reason_id, cancelled_by)?;

        let note = self
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN) {
            return Err(OrderError::InvalidInput(format!(
                "cancellation note exceeds {MAX_NOTE_LEN} characters"
            )));
        }

        // 3. Ledger
        let entries = LedgerAccountant::new(ctx.storage(), ctx.config()).post(
            ctx.txn(),
            &order,
            PostingKind::Cancelled {
                cancelled_by,
                reached_accepted: order.has_reached(OrderStatus::Accepted),
            },
        )?;

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.clone(),
            metadata.command_id.clone(),
            metadata.timestamp,
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                from: order.status,
                cancelled_by,
                reason_id: self.reason_id,
                note,
                ledger_entry_ids: entries.iter().map(|e| e.entry_id).collect(),
            },
        );

        Ok(vec![event])
    }
}
