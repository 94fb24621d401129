//! Health check
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/health | GET | none |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "epoch": "…", "sequence": 42 }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    /// Changes on every restart
    epoch: String,
    /// Last committed event sequence, absent when storage is unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let orders = state.orders.clone();
    let sequence = tokio::task::spawn_blocking(move || orders.get_current_sequence())
        .await
        .ok()
        .and_then(|r| {
            r.inspect_err(|e| tracing::warn!(error = %e, "Health check storage read failed"))
                .ok()
        });

    Json(HealthResponse {
        status: if sequence.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        epoch: state.orders.epoch().to_string(),
        sequence,
    })
}
