//! Review API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::db::models::{Review, ReviewCreate, ReviewQuery};
use crate::db::repository::{OrderRepository, ReviewRepository};
use crate::orders::lifecycle::order_not_found;
use crate::utils::{AppError, AppResult, ErrorCode, validate};

/// GET /api/reviews - newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let repo = ReviewRepository::new(state.db.clone());
    Ok(Json(repo.find_all(&query).await?))
}

/// POST /api/reviews - the table is taken from the order, not the body
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ReviewCreate>,
) -> AppResult<Json<Review>> {
    validate(&payload)?;

    let order = OrderRepository::new(state.db.clone())
        .find_by_id(payload.order_id)
        .await?
        .ok_or_else(|| order_not_found(payload.order_id))?;

    let review = ReviewRepository::new(state.db.clone())
        .create(order.id, order.table_id, payload.rating, payload.comment)
        .await?;

    tracing::info!(order_id = order.id, rating = review.rating, "Review submitted");
    Ok(Json(review))
}

/// DELETE /api/reviews/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = ReviewRepository::new(state.db.clone());
    if !repo.delete(id).await? {
        return Err(AppError::with_message(
            ErrorCode::ReviewNotFound,
            format!("Review {id} not found"),
        ));
    }
    tracing::info!(review_id = id, "Review deleted");
    Ok(Json(true))
}
