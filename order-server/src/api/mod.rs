//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness
//! - [`orders`] - order commands and queries
//! - [`stores`] - store upsert, ledger statement, payouts, adjustments
//! - [`payments`] - gateway callback
//! - [`cancellation_reasons`] - reason catalog
//!
//! The engine is synchronous (one redb write transaction per mutation), so
//! every handler hands its work to [`run_blocking`].

pub mod cancellation_reasons;
pub mod health;
pub mod orders;
pub mod payments;
pub mod stores;

use axum::Router;
use shared::order::{Actor, ActorRole};

use crate::core::ServerState;
use crate::orders::OrdersManager;
use crate::utils::{AppError, AppResult};

/// Every route, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(stores::router())
        .merge(payments::router())
        .merge(cancellation_reasons::router())
}

/// Run engine work off the async runtime
pub async fn run_blocking<T, F>(state: &ServerState, work: F) -> AppResult<T>
where
    F: FnOnce(OrdersManager) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let orders = state.orders.clone();
    tokio::task::spawn_blocking(move || work(orders))
        .await
        .map_err(|e| AppError::internal(format!("Engine task failed: {e}")))?
}

/// Administrative endpoints are reserved for the platform itself
pub fn require_system(actor: &Actor, operation: &str) -> AppResult<()> {
    if actor.role == ActorRole::System {
        return Ok(());
    }
    let role = actor.role.to_string();
    crate::security_log!(
        "WARN",
        "admin_endpoint_denied",
        actor_id = actor.id.as_str(),
        role = role.as_str(),
        operation = operation
    );
    Err(AppError::permission_denied(format!(
        "{operation} is reserved for the system actor"
    )))
}
