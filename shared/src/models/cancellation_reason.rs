//! Cancellation Reason Model

use serde::{Deserialize, Serialize};

/// Reserved reason for automated cancellations
pub const SYSTEM_REASON_ID: i64 = 0;
pub const SYSTEM_REASON_TEXT: &str = "System cancellation";

/// Catalog entry referenced by cancelled orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancellationReason {
    pub id: i64,
    pub reason_text: String,
    pub is_active: bool,
    pub created_at: i64,
}

impl CancellationReason {
    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_REASON_ID
    }

    /// Uniqueness key: trimmed, lowercased
    pub fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

/// Create cancellation reason payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReasonCreate {
    pub reason_text: String,
}
