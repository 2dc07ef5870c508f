//! Dining Table API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::{TABLES_MANAGE, TABLES_READ};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    // Scanned QR codes land here
    let public = Router::new().route("/number/{number}", get(handler::get_by_number));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission(TABLES_READ)));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/qr", get(handler::get_qr).delete(handler::delete_qr))
        .layer(middleware::from_fn(require_permission(TABLES_MANAGE)));

    public.merge(read_routes).merge(manage_routes)
}
