//! Menu API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::MENU_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menus", routes())
}

fn routes() -> Router<ServerState> {
    let public = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/nutrition", post(handler::estimate_nutrition))
        .layer(middleware::from_fn(require_permission(MENU_MANAGE)));

    public.merge(manage)
}
