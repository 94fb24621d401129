//! StatusAdvanced event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// StatusAdvanced applier
pub struct StatusAdvancedApplier;

impl EventApplier for StatusAdvancedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::StatusAdvanced { to, .. } = &event.payload {
            snapshot.status = *to;
            if to.rank() > snapshot.furthest_status.rank() {
                snapshot.furthest_status = *to;
            }

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
