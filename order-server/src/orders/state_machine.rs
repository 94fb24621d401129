//! Order status graph
//!
//! ```text
//! PENDING → ACCEPTED → PREPARING → READY_FOR_PICKUP → ASSIGNED → OUT_FOR_DELIVERY → DELIVERED
//!    └──────────┴───────────┴─────────────┴──────────────┴──────────────┴──→ CANCELLED
//! ```
//!
//! `DELIVERED` and `CANCELLED` are terminal. Every status-changing action goes
//! through [`begin_transition`], which fixes the order of checks: load,
//! terminal, adjacency, then authorization.

use shared::models::Store;
use shared::order::{OrderSnapshot, OrderStatus};

use super::traits::{CommandContext, CommandMetadata, OrderError};
use crate::auth::{RequestedTransition, authorize};

/// Next status on the happy path
pub fn next_on_path(from: OrderStatus) -> Option<OrderStatus> {
    match from {
        OrderStatus::Pending => Some(OrderStatus::Accepted),
        OrderStatus::Accepted => Some(OrderStatus::Preparing),
        OrderStatus::Preparing => Some(OrderStatus::ReadyForPickup),
        OrderStatus::ReadyForPickup => Some(OrderStatus::Assigned),
        OrderStatus::Assigned => Some(OrderStatus::OutForDelivery),
        OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
        OrderStatus::Delivered | OrderStatus::Cancelled => None,
    }
}

pub fn is_adjacent(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() {
        return false;
    }
    to == OrderStatus::Cancelled || next_on_path(from) == Some(to)
}

/// Terminal check first, even when `to` equals the current status
pub fn check_transition(order: &OrderSnapshot, to: OrderStatus) -> Result<(), OrderError> {
    if order.status.is_terminal() {
        return Err(OrderError::AlreadyTerminal {
            order_id: order.order_id.clone(),
            status: order.status,
        });
    }
    if !is_adjacent(order.status, to) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to,
        });
    }
    Ok(())
}

/// Load the order and its store, then run the state and policy checks
pub fn begin_transition(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    order_id: &str,
    requested: RequestedTransition,
) -> Result<(OrderSnapshot, Store), OrderError> {
    let order = ctx.load_snapshot(order_id)?;

    if let Some(to) = requested.target() {
        check_transition(&order, to)?;
    }

    let store = ctx.load_store(order.store_id)?;
    authorize(&metadata.actor, &order, &store, requested)
        .into_result()
        .map_err(OrderError::Unauthorized)?;

    Ok((order, store))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
        OrderStatus::Assigned,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn order(status: OrderStatus) -> OrderSnapshot {
        let mut order = OrderSnapshot::new("order-1".to_string());
        order.status = status;
        order
    }

    #[test]
    fn test_happy_path_is_linear() {
        let mut status = OrderStatus::Pending;
        let mut steps = 0;
        while let Some(next) = next_on_path(status) {
            assert!(is_adjacent(status, next));
            status = next;
            steps += 1;
        }
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_cancel_reachable_from_every_non_terminal() {
        for status in ALL {
            assert_eq!(
                is_adjacent(status, OrderStatus::Cancelled),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_skipping_is_invalid() {
        let result = check_transition(&order(OrderStatus::Pending), OrderStatus::Preparing);
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Preparing
            })
        ));
        assert!(matches!(
            check_transition(&order(OrderStatus::Preparing), OrderStatus::Accepted),
            Err(OrderError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_rejects_everything() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in ALL {
                assert!(
                    matches!(
                        check_transition(&order(terminal), to),
                        Err(OrderError::AlreadyTerminal { .. })
                    ),
                    "{terminal} -> {to}"
                );
            }
        }
    }
}
