//! Cancellation reason catalog API
//!
//! | Path | Method | Who |
//! |------|--------|-----|
//! | /api/cancellation-reasons | GET | any actor |
//! | /api/cancellation-reasons | POST | system |
//! | /api/cancellation-reasons/{id} | DELETE | system (deactivates) |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use shared::models::{CancellationReason, CancellationReasonCreate};

use crate::api::{require_system, run_blocking};
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/cancellation-reasons", get(list).post(register))
        .route("/api/cancellation-reasons/{id}", delete(deactivate))
}

async fn list(
    State(state): State<ServerState>,
    CurrentActor(_actor): CurrentActor,
) -> AppResult<Json<Vec<CancellationReason>>> {
    let reasons = run_blocking(&state, |orders| Ok(orders.list_cancellation_reasons()?)).await?;
    Ok(Json(reasons))
}

async fn register(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CancellationReasonCreate>,
) -> AppResult<ApiResponse<CancellationReason>> {
    require_system(&actor, "register_cancellation_reason")?;
    let reason = run_blocking(&state, move |orders| {
        Ok(orders.register_cancellation_reason(&payload.reason_text)?)
    })
    .await?;
    tracing::info!(reason_id = reason.id, text = %reason.reason_text, "Cancellation reason registered");
    Ok(ApiResponse::success(reason))
}

async fn deactivate(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<CancellationReason>> {
    require_system(&actor, "deactivate_cancellation_reason")?;
    let reason =
        run_blocking(&state, move |orders| Ok(orders.deactivate_cancellation_reason(id)?)).await?;
    Ok(ApiResponse::success(reason))
}
