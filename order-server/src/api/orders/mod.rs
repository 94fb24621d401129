//! Order API Module
//!
//! Every mutation is an `OrderCommand` executed by the OrdersManager; the
//! caller's identity comes from the `CurrentActor` extractor.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub use handler::OrderAction;

/// Order router
///
/// | Path | Method | Operation |
/// |------|--------|-----------|
/// | /api/orders | POST | create |
/// | /api/orders/{id} | GET | snapshot |
/// | /api/orders/{id}/events | GET | event log |
/// | /api/orders/{id}/{action} | POST | accept, reject, prepare, ready, claim, pickup, deliver, cancel |
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/events", get(handler::list_events))
        .route("/api/orders/{id}/{action}", post(handler::apply_action))
}
