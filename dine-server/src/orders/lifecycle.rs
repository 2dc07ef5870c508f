//! Order lifecycle: status changes driven by staff and customers
//!
//! Every change goes through [`OrderStatus::apply`]; the store write is
//! conditional on the status that was checked, and the response is always
//! re-read from the store.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{OrderEvent, OrderStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Order, Review};
use crate::db::repository::review::new_review;
use crate::db::repository::{CartRepository, DiningTableRepository, OrderRepository, ReviewRepository};

#[derive(Clone)]
pub struct OrderLifecycle {
    orders: OrderRepository,
    carts: CartRepository,
    tables: DiningTableRepository,
    reviews: ReviewRepository,
}

impl OrderLifecycle {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            carts: CartRepository::new(db.clone()),
            tables: DiningTableRepository::new(db.clone()),
            reviews: ReviewRepository::new(db),
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Order> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))
    }

    /// Run `event` against the stored order
    pub async fn apply(&self, order: &Order, event: OrderEvent) -> AppResult<Order> {
        let next = order.status.apply(event)?;
        if next == order.status {
            return self.get(order.id).await;
        }

        let written = self
            .orders
            .transition(order.id, order.status, next, None)
            .await?;
        if !written {
            return Err(self.raced(order.id, event).await);
        }

        tracing::info!(
            order_id = order.id,
            from = %order.status,
            to = %next,
            event = event.as_str(),
            "Order status changed"
        );
        self.get(order.id).await
    }

    /// `PUT /api/orders/{id}/status`: only single kitchen steps are allowed
    pub async fn staff_update(&self, id: i64, target: OrderStatus) -> AppResult<Order> {
        let order = self.get(id).await?;
        let event = order.status.staff_event_to(target)?;
        let updated = self.apply(&order, event).await?;

        if let Err(e) = self.carts.track(updated.table_id, updated.status).await {
            tracing::warn!(order_id = id, error = %e, "Failed to mirror status onto cart");
        }
        Ok(updated)
    }

    /// Customer confirms a served order and leaves a review.
    ///
    /// The status change and the review are written together, so a failed
    /// review leaves the order `served` and the customer can retry.
    pub async fn complete(
        &self,
        id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> AppResult<(Order, Review)> {
        let order = self.get(id).await?;
        order.status.apply(OrderEvent::Complete)?;

        let review = new_review(order.id, order.table_id, rating, comment);
        let review_id = review.id;
        if !self.orders.complete(&order, review).await? {
            return Err(self.raced(id, OrderEvent::Complete).await);
        }
        tracing::info!(order_id = id, rating, "Order completed");

        let done = self.get(id).await?;
        let review = self.reviews.find_by_id(review_id).await?.ok_or_else(|| {
            AppError::with_message(ErrorCode::ReviewNotFound, format!("Review {review_id} not found"))
        })?;

        self.release_table(&done).await;
        Ok((done, review))
    }

    /// Hard delete, `pending` only
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let order = self.get(id).await?;
        if !order.status.is_deletable() {
            return Err(AppError::with_message(
                ErrorCode::OrderNotDeletable,
                format!("Order {id} is {} and can no longer be deleted", order.status),
            )
            .with_detail("status", order.status.as_str()));
        }
        self.orders.delete(id).await?;
        tracing::info!(order_id = id, "Pending order deleted");
        Ok(())
    }

    /// Error for a conditional write that found the order already moved
    async fn raced(&self, id: i64, event: OrderEvent) -> AppError {
        let current = match self.get(id).await {
            Ok(current) => current,
            Err(e) => return e,
        };
        AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!(
                "Order {id} moved to {} before {} could be applied",
                current.status,
                event.as_str()
            ),
        )
        .with_detail("from", current.status.as_str())
        .with_detail("event", event.as_str())
    }

    /// Free the table and take its cart out of the queue once the order is over
    async fn release_table(&self, order: &Order) {
        match self.tables.find_by_id(order.table_id).await {
            Ok(Some(table)) if table.active_order_id == Some(order.id) => {
                if let Err(e) = self.tables.release(order.table_id).await {
                    tracing::warn!(table_id = order.table_id, error = %e, "Failed to release table");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(table_id = order.table_id, error = %e, "Failed to load table"),
        }
        if let Err(e) = self.carts.deactivate(order.table_id).await {
            tracing::warn!(table_id = order.table_id, error = %e, "Failed to deactivate cart");
        }
    }
}

pub(crate) fn order_not_found(id: impl std::fmt::Display) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
}
