//! Upload Routes
//!
//! - POST /api/upload: menu image upload, `menu:manage`
//! - GET /api/image/{filename}: public, served from the uploads dir

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::auth::permissions::MENU_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub use handler::MAX_FILE_SIZE;

pub fn router() -> Router<ServerState> {
    let public = Router::new().route("/api/image/{filename}", get(handler::serve));

    // Body limit leaves room for the multipart framing around a max-size file
    let upload = Router::new()
        .route("/api/upload", post(handler::upload))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 512 * 1024))
        .layer(middleware::from_fn(require_permission(MENU_MANAGE)));

    public.merge(upload)
}
