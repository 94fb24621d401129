//! Order API Handlers

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::SYSTEM_REASON_ID;
use shared::money::Money;
use shared::order::{
    ActorRole, CommandResponse, GeoPoint, OrderCommand, OrderCommandPayload, OrderEvent,
    OrderItemInput, OrderSnapshot,
};

use crate::api::run_blocking;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, command_result};

/// Checkout request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Client idempotency key; retries must reuse it
    #[serde(default)]
    pub command_id: Option<String>,
    pub store_id: i64,
    pub items: Vec<OrderItemInput>,
    pub delivery_fee: Money,
    pub delivery_location: GeoPoint,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub expected_total: Option<Money>,
}

/// Body of `POST /api/orders/{id}/{action}`, all optional
#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub command_id: Option<String>,
    /// Required for reject / cancel, except for the system actor
    #[serde(default)]
    pub reason_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Path segment naming a lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject,
    Prepare,
    Ready,
    Claim,
    Pickup,
    Deliver,
    Cancel,
}

impl FromStr for OrderAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(OrderAction::Accept),
            "reject" => Ok(OrderAction::Reject),
            "prepare" => Ok(OrderAction::Prepare),
            "ready" => Ok(OrderAction::Ready),
            "claim" => Ok(OrderAction::Claim),
            "pickup" => Ok(OrderAction::Pickup),
            "deliver" => Ok(OrderAction::Deliver),
            "cancel" => Ok(OrderAction::Cancel),
            other => Err(AppError::not_found(format!("Order action '{other}'"))),
        }
    }
}

impl OrderAction {
    /// Build the command payload for `order_id`
    pub fn payload(
        self,
        order_id: String,
        role: ActorRole,
        body: ActionRequest,
    ) -> AppResult<OrderCommandPayload> {
        let payload = match self {
            OrderAction::Accept => OrderCommandPayload::AcceptOrder { order_id },
            OrderAction::Prepare => OrderCommandPayload::StartPreparing { order_id },
            OrderAction::Ready => OrderCommandPayload::MarkReadyForPickup { order_id },
            OrderAction::Claim => OrderCommandPayload::AcceptDelivery { order_id },
            OrderAction::Pickup => OrderCommandPayload::PickUpOrder { order_id },
            OrderAction::Deliver => OrderCommandPayload::MarkDelivered { order_id },
            OrderAction::Reject => OrderCommandPayload::RejectOrder {
                order_id,
                reason_id: reason_for(role, body.reason_id)?,
                note: body.note,
            },
            OrderAction::Cancel => OrderCommandPayload::CancelOrder {
                order_id,
                reason_id: reason_for(role, body.reason_id)?,
                note: body.note,
            },
        };
        Ok(payload)
    }
}

/// Automated cancellations fall back to the reserved system reason
fn reason_for(role: ActorRole, reason_id: Option<i64>) -> AppResult<i64> {
    match (reason_id, role) {
        (Some(id), _) => Ok(id),
        (None, ActorRole::System) => Ok(SYSTEM_REASON_ID),
        (None, _) => Err(AppError::validation("reason_id is required")),
    }
}

fn order_not_found(order_id: &str) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {order_id} not found"))
}

fn with_client_id(cmd: OrderCommand, command_id: Option<String>) -> OrderCommand {
    match command_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => cmd.with_id(id),
        None => cmd,
    }
}

/// Create an order
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<ApiResponse<CommandResponse>> {
    let cmd = with_client_id(
        OrderCommand::new(
            actor,
            OrderCommandPayload::CreateOrder {
                store_id: req.store_id,
                items: req.items,
                delivery_fee: req.delivery_fee,
                delivery_location: req.delivery_location,
                payment_reference: req.payment_reference,
                expected_total: req.expected_total,
            },
        ),
        req.command_id,
    );

    let response = run_blocking(&state, move |orders| Ok(orders.execute_command(cmd))).await?;
    Ok(ApiResponse::success(command_result(response)?))
}

/// Apply a lifecycle step
pub async fn apply_action(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path((id, action)): Path<(String, String)>,
    body: Option<Json<ActionRequest>>,
) -> AppResult<ApiResponse<CommandResponse>> {
    let action: OrderAction = action.parse()?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let command_id = body.command_id.clone();
    let payload = action.payload(id, actor.role, body)?;
    let cmd = with_client_id(OrderCommand::new(actor, payload), command_id);

    let response = run_blocking(&state, move |orders| Ok(orders.execute_command(cmd))).await?;
    Ok(ApiResponse::success(command_result(response)?))
}

/// Get order snapshot by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(_actor): CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<OrderSnapshot>> {
    let order = run_blocking(&state, move |orders| {
        orders.get_order(&id)?.ok_or_else(|| order_not_found(&id))
    })
    .await?;
    Ok(Json(order))
}

/// Event log of one order, in sequence order
pub async fn list_events(
    State(state): State<ServerState>,
    CurrentActor(_actor): CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<OrderEvent>>> {
    let events = run_blocking(&state, move |orders| {
        let events = orders.get_events_for_order(&id)?;
        if events.is_empty() && orders.get_order(&id)?.is_none() {
            return Err(order_not_found(&id));
        }
        Ok(events)
    })
    .await?;
    Ok(Json(events))
}
