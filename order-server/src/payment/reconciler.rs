//! Inbound gateway callbacks
//!
//! A callback only names a payment reference. The reconciler finds the
//! order that reference was issued for, optionally asks the gateway to
//! confirm the outcome, and then submits a `ReconcilePayment` command as the
//! system actor. Gateway I/O never happens inside the write transaction.

use std::sync::Arc;

use shared::order::{
    Actor, CommandError, CommandErrorCode, CommandResponse, GatewayTransaction, OrderCommand,
    OrderCommandPayload,
};

use super::ReconciliationError;
use super::gateway::PaymentGateway;
use crate::orders::OrdersManager;

pub struct PaymentReconciler {
    orders: OrdersManager,
    /// Present when callbacks must be confirmed with the gateway
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl std::fmt::Debug for PaymentReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentReconciler")
            .field("verifies_callbacks", &self.gateway.is_some())
            .finish()
    }
}

/// Idempotency key for a gateway outcome; a redelivered callback maps to
/// the same command.
fn callback_command_id(callback: &GatewayTransaction) -> String {
    format!(
        "payment:{}:{}",
        callback.reference,
        callback.status.to_payment_status()
    )
}

fn rejection(command_id: String, code: CommandErrorCode, err: impl ToString) -> CommandResponse {
    CommandResponse::error(command_id, CommandError::new(code, err.to_string()))
}

impl PaymentReconciler {
    pub fn new(orders: OrdersManager, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self { orders, gateway }
    }

    pub fn verifies_callbacks(&self) -> bool {
        self.gateway.is_some()
    }

    /// Apply a gateway callback to its order
    pub async fn handle_callback(&self, callback: GatewayTransaction) -> CommandResponse {
        let command_id = callback_command_id(&callback);

        // 1. Route by reference
        let order_id = match self
            .orders
            .find_order_by_payment_reference(&callback.reference)
        {
            Ok(Some(order_id)) => order_id,
            Ok(None) => {
                crate::security_log!(
                    "WARN",
                    "payment_reference_unknown",
                    reference = callback.reference.as_str()
                );
                let err = ReconciliationError::ReferenceMismatch {
                    expected: None,
                    received: callback.reference.clone(),
                };
                return rejection(command_id, CommandErrorCode::ReferenceMismatch, err);
            }
            Err(e) => {
                tracing::error!(reference = %callback.reference, error = %e, "Payment reference lookup failed");
                return rejection(command_id, e.code(), e);
            }
        };

        // 2. Confirm with the gateway, outside any transaction
        if let Some(gateway) = &self.gateway
            && let Err((code, err)) = self.confirm(gateway.as_ref(), &callback).await
        {
            return rejection(command_id, code, err);
        }

        // 3. Apply as the system actor
        let cmd = OrderCommand::new(
            Actor::system(),
            OrderCommandPayload::ReconcilePayment {
                order_id: order_id.clone(),
                gateway_reference: callback.reference.clone(),
                status: callback.status.to_payment_status(),
                amount: callback.amount,
            },
        )
        .with_id(command_id.clone());

        let orders = self.orders.clone();
        match tokio::task::spawn_blocking(move || orders.execute_command(cmd)).await {
            Ok(response) => {
                tracing::info!(
                    order_id = %order_id,
                    reference = %callback.reference,
                    status = ?callback.status,
                    success = response.success,
                    "Payment callback processed"
                );
                response
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Payment reconciliation task failed");
                rejection(command_id, CommandErrorCode::InternalError, e)
            }
        }
    }

    /// The gateway's own record must agree with the callback
    async fn confirm(
        &self,
        gateway: &dyn PaymentGateway,
        callback: &GatewayTransaction,
    ) -> Result<(), (CommandErrorCode, ReconciliationError)> {
        let verified = gateway.verify(&callback.reference).await.map_err(|e| {
            tracing::warn!(reference = %callback.reference, error = %e, "Gateway verification unavailable");
            (CommandErrorCode::SystemBusy, ReconciliationError::from(e))
        })?;

        if verified.reference != callback.reference || verified.status != callback.status {
            let verified_status = format!("{:?}", verified.status);
            let claimed_status = format!("{:?}", callback.status);
            crate::security_log!(
                "WARN",
                "payment_callback_disputed",
                reference = callback.reference.as_str(),
                verified_reference = verified.reference.as_str(),
                verified_status = verified_status.as_str(),
                claimed_status = claimed_status.as_str()
            );
            return Err((
                CommandErrorCode::ReferenceMismatch,
                ReconciliationError::ReferenceMismatch {
                    expected: Some(verified.reference),
                    received: callback.reference.clone(),
                },
            ));
        }

        if verified.amount != callback.amount {
            crate::security_log!(
                "WARN",
                "payment_amount_disputed",
                reference = callback.reference.as_str(),
                verified_amount = verified.amount.minor(),
                claimed_amount = callback.amount.minor()
            );
            return Err((
                CommandErrorCode::AmountMismatch,
                ReconciliationError::AmountMismatch {
                    expected: verified.amount,
                    received: callback.amount,
                },
            ));
        }

        Ok(())
    }
}
