//! OrderCancelled event applier
//!
//! `furthest_status` is left alone so fee rules can still see how far the
//! order got before it was cancelled.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled {
            cancelled_by,
            reason_id,
            note,
            ..
        } = &event.payload
        {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.cancelled_by = Some(*cancelled_by);
            snapshot.cancellation_reason_id = Some(*reason_id);
            snapshot.cancellation_note = note.clone();

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
