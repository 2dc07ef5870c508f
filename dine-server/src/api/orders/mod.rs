//! Order API
//!
//! | path | method | access |
//! |------|------|------|
//! | /api/orders/checkout | POST | public |
//! | /api/orders/table/{table_id} | GET | public |
//! | /api/orders/{id} | GET, DELETE | public |
//! | /api/orders/{id}/complete | POST | public |
//! | /api/orders | GET | orders:manage |
//! | /api/orders/history | GET | orders:manage |
//! | /api/orders/{id}/status | PUT | orders:manage |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::ORDERS_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let public = Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/table/{table_id}", get(handler::list_for_table))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/complete", post(handler::complete));

    let manage = Router::new()
        .route("/", get(handler::list))
        .route("/history", get(handler::history))
        .route("/{id}/status", put(handler::update_status))
        .layer(middleware::from_fn(require_permission(ORDERS_MANAGE)));

    public.merge(manage)
}
