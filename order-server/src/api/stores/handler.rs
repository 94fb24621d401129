//! Store API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    AdjustmentRequest, BalanceCheck, PayoutRequest, Store, StoreLedgerEntry, StoreUpsert,
};
use shared::order::{Actor, ActorRole};

use crate::api::{require_system, run_blocking};
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::OrdersManager;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// Statement window, `[from, to)` in Unix milliseconds
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

impl LedgerQuery {
    fn range(&self) -> AppResult<(i64, i64)> {
        let from = self.from.unwrap_or(0);
        let to = self.to.unwrap_or(i64::MAX);
        if from > to {
            return Err(AppError::validation(format!(
                "from ({from}) must not be after to ({to})"
            )));
        }
        Ok((from, to))
    }
}

fn store_not_found(store_id: i64) -> AppError {
    AppError::with_message(ErrorCode::StoreNotFound, format!("Store {store_id} not found"))
}

/// Load a store the actor may read: the system, or the owning merchant
fn readable_store(orders: &OrdersManager, actor: &Actor, store_id: i64) -> AppResult<Store> {
    let store = orders
        .get_store(store_id)?
        .ok_or_else(|| store_not_found(store_id))?;
    match actor.role {
        ActorRole::System => Ok(store),
        ActorRole::Merchant if store.owner_id == actor.id => Ok(store),
        _ => {
            let role = actor.role.to_string();
            crate::security_log!(
                "WARN",
                "store_read_denied",
                actor_id = actor.id.as_str(),
                role = role.as_str(),
                store_id = store_id
            );
            Err(AppError::permission_denied("Not the owner of this store"))
        }
    }
}

/// Create or update a store's collaborator-owned fields
pub async fn upsert(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<StoreUpsert>,
) -> AppResult<ApiResponse<Store>> {
    require_system(&actor, "upsert_store")?;
    let store = run_blocking(&state, move |orders| Ok(orders.upsert_store(id, payload)?)).await?;
    Ok(ApiResponse::success(store))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Store>> {
    let store = run_blocking(&state, move |orders| readable_store(&orders, &actor, id)).await?;
    Ok(Json(store))
}

/// Statement export
pub async fn list_ledger(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<StoreLedgerEntry>>> {
    let (from, to) = query.range()?;
    let entries = run_blocking(&state, move |orders| {
        readable_store(&orders, &actor, id)?;
        Ok(orders.list_ledger_entries(id, from, to)?)
    })
    .await?;
    Ok(Json(entries))
}

/// Cached balance against the sum of entries
pub async fn verify_balance(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<BalanceCheck>> {
    require_system(&actor, "verify_store_balance")?;
    let check = run_blocking(&state, move |orders| Ok(orders.verify_store_balance(id)?)).await?;
    if !check.is_consistent() {
        tracing::error!(
            store_id = id,
            cached = %check.cached,
            computed = %check.computed,
            "Store balance does not match its ledger"
        );
    }
    Ok(Json(check))
}

pub async fn record_payout(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<PayoutRequest>,
) -> AppResult<ApiResponse<StoreLedgerEntry>> {
    let entry = run_blocking(&state, move |orders| {
        Ok(orders.record_payout(&actor, id, req.amount, req.note)?)
    })
    .await?;
    Ok(ApiResponse::success(entry))
}

pub async fn post_adjustment(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<AdjustmentRequest>,
) -> AppResult<ApiResponse<StoreLedgerEntry>> {
    let entry = run_blocking(&state, move |orders| {
        Ok(orders.post_adjustment(&actor, id, req.order_id, req.amount, &req.note)?)
    })
    .await?;
    Ok(ApiResponse::success(entry))
}
