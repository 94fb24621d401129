//! Payment gateway callback
//!
//! Called by the gateway, not by an app user, so no actor headers are read.
//! The reconciler resolves the order by reference and applies the outcome
//! as the system actor.

use axum::{Router, extract::State, routing::post};
use axum::Json;
use shared::order::{CommandResponse, GatewayTransaction};

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, command_result};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/callback", post(callback))
}

async fn callback(
    State(state): State<ServerState>,
    Json(callback): Json<GatewayTransaction>,
) -> AppResult<ApiResponse<CommandResponse>> {
    tracing::info!(
        reference = %callback.reference,
        status = ?callback.status,
        amount = %callback.amount,
        "Payment callback received"
    );
    let response = state.reconciler.handle_callback(callback).await;
    Ok(ApiResponse::success(command_result(response)?))
}
