//! Restaurant Profile API

mod handler;

use axum::{Router, middleware, routing::get, routing::put};

use crate::auth::permissions::RESTAURANT_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let public = Router::new().route("/api/restaurant", get(handler::get));

    let manage = Router::new()
        .route("/api/restaurant", put(handler::update))
        .layer(middleware::from_fn(require_permission(RESTAURANT_MANAGE)));

    public.merge(manage)
}
