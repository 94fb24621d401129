//! Payment gateway reconciliation
//!
//! Inbound callbacks are (optionally) verified against the gateway outside
//! any transaction, then applied to the order as a `ReconcilePayment`
//! command executed by the system actor.

pub mod gateway;
pub mod reconciler;

pub use gateway::{GatewayError, HttpPaymentGateway, PaymentGateway};
pub use reconciler::PaymentReconciler;

use shared::money::Money;
use shared::order::PaymentStatus;
use thiserror::Error;

/// Rejected gateway input. Logged as a potential replay or forgery.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Payment reference mismatch: expected {expected:?}, received {received}")]
    ReferenceMismatch {
        expected: Option<String>,
        received: String,
    },

    #[error("Payment amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: Money, received: Money },

    #[error("Payment status {from} cannot move to {to}")]
    AlreadyFinal {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Gateway verification failed: {0}")]
    Verification(#[from] GatewayError),
}
