//! Payment API
//!
//! - POST /api/payment/notification: gateway webhook, public
//! - GET /api/payment/status/{order_id}: pull the gateway status and reconcile

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::permissions::ORDERS_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let webhook = Router::new().route("/api/payment/notification", post(handler::notification));

    let manage = Router::new()
        .route("/api/payment/status/{order_id}", get(handler::refresh_status))
        .layer(middleware::from_fn(require_permission(ORDERS_MANAGE)));

    webhook.merge(manage)
}
