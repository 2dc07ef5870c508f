//! Review API

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::permissions::{REVIEWS_MANAGE, REVIEWS_READ};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    let public = Router::new().route("/", post(handler::create));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission(REVIEWS_READ)));

    let manage_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission(REVIEWS_MANAGE)));

    public.merge(read_routes).merge(manage_routes)
}
