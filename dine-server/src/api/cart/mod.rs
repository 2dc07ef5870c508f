//! Cart API
//!
//! Customers edit their table's cart without logging in; only staff can
//! push a cart into the kitchen queue by hand.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::CART_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    let public = Router::new()
        .route("/{table_id}", get(handler::get).delete(handler::clear))
        .route("/{table_id}/items", post(handler::add_item))
        .route(
            "/{table_id}/items/{item_id}",
            put(handler::update_item).delete(handler::remove_item),
        );

    let manage = Router::new()
        .route("/{table_id}/activate", post(handler::activate))
        .layer(middleware::from_fn(require_permission(CART_MANAGE)));

    public.merge(manage)
}
