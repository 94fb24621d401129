//! Store API Module
//!
//! Store master data belongs to the platform; merchants may only read their
//! own store and its ledger statement.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/stores/{id}",
            get(handler::get_by_id).put(handler::upsert),
        )
        .route("/api/stores/{id}/ledger", get(handler::list_ledger))
        .route("/api/stores/{id}/balance", get(handler::verify_balance))
        .route("/api/stores/{id}/payouts", post(handler::record_payout))
        .route("/api/stores/{id}/adjustments", post(handler::post_adjustment))
}
