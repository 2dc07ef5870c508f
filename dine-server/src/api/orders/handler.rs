//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::client::CompletedOrder;

use crate::core::ServerState;
use crate::db::models::{
    CheckoutRequest, CompleteOrderRequest, HistoryQuery, Order, OrderQuery, StatusUpdateRequest,
};
use crate::db::repository::OrderRepository;
use crate::orders::{Checkout, OrderLifecycle};
use crate::utils::{AppResult, validate};

/// POST /api/orders/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<Order>> {
    validate(&payload)?;
    let order = Checkout::new(state.db.clone(), state.gateway.clone())
        .run(payload)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/table/{table_id} - newest first, polled by the customer view
pub async fn list_for_table(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_by_table(table_id).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(OrderLifecycle::new(state.db.clone()).get(id).await?))
}

/// DELETE /api/orders/{id} - pending orders only
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    OrderLifecycle::new(state.db.clone()).delete(id).await?;
    Ok(Json(true))
}

/// POST /api/orders/{id}/complete
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CompleteOrderRequest>,
) -> AppResult<Json<CompletedOrder>> {
    validate(&payload)?;
    let (order, review) = OrderLifecycle::new(state.db.clone())
        .complete(id, payload.rating, payload.comment)
        .await?;
    Ok(Json(CompletedOrder { order, review }))
}

/// GET /api/orders?status=&table_id=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_all(&query).await?))
}

/// GET /api/orders/history?from=&to=
pub async fn history(
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.history(&query).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<Order>> {
    let order = OrderLifecycle::new(state.db.clone())
        .staff_update(id, payload.status)
        .await?;
    Ok(Json(order))
}
