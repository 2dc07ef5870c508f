//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{AddCartItem, Cart, UpdateCartItem};
use crate::db::repository::{CartRepository, DiningTableRepository, RepoError};
use crate::utils::{AppError, AppResult, ErrorCode, validate};

/// Carts only exist for real tables
async fn cart_repo(state: &ServerState, table_id: i64) -> AppResult<CartRepository> {
    let tables = DiningTableRepository::new(state.db.clone());
    if tables.find_by_id(table_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::TableNotFound,
            format!("Table {table_id} not found"),
        ));
    }
    Ok(CartRepository::new(state.db.clone()))
}

/// GET /api/cart/{table_id}
pub async fn get(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<Cart>> {
    let repo = cart_repo(&state, table_id).await?;
    Ok(Json(repo.get(table_id).await?))
}

/// POST /api/cart/{table_id}/items - add, or bump an existing line
pub async fn add_item(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
    Json(payload): Json<AddCartItem>,
) -> AppResult<Json<Cart>> {
    validate(&payload)?;
    let repo = cart_repo(&state, table_id).await?;
    Ok(Json(repo.add(table_id, payload.into()).await?))
}

/// PUT /api/cart/{table_id}/items/{item_id} - quantity `<= 0` removes
pub async fn update_item(
    State(state): State<ServerState>,
    Path((table_id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateCartItem>,
) -> AppResult<Json<Cart>> {
    let repo = cart_repo(&state, table_id).await?;
    let cart = repo
        .update_quantity(table_id, item_id, payload.quantity)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::CartItemNotFound, msg),
            other => other.into(),
        })?;
    Ok(Json(cart))
}

/// DELETE /api/cart/{table_id}/items/{item_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    Path((table_id, item_id)): Path<(i64, i64)>,
) -> AppResult<Json<Cart>> {
    let repo = cart_repo(&state, table_id).await?;
    Ok(Json(repo.remove(table_id, item_id).await?))
}

/// DELETE /api/cart/{table_id}
pub async fn clear(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<Cart>> {
    let repo = cart_repo(&state, table_id).await?;
    Ok(Json(repo.clear(table_id).await?))
}

/// POST /api/cart/{table_id}/activate
pub async fn activate(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<Cart>> {
    let repo = cart_repo(&state, table_id).await?;
    let cart = repo.activate(table_id).await?;
    tracing::info!(table_id, "Cart activated by staff");
    Ok(Json(cart))
}
