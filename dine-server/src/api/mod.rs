//! HTTP API
//!
//! One sub-module per resource, each exposing `router()`. Routes carry full
//! `/api/...` paths; public and permission-gated routes live in separate
//! sub-routers so a permission layer never wraps a public route.
//!
//! - [`health`] - liveness and database check
//! - [`auth`] - login, logout, current user
//! - [`restaurant`] - restaurant profile
//! - [`menus`] - menu items and nutrition estimates
//! - [`tables`] - dining tables and QR codes
//! - [`cart`] - per-table carts
//! - [`orders`] - checkout and order lifecycle
//! - [`payment`] - gateway webhook and status refresh
//! - [`reviews`] - customer reviews
//! - [`users`] - staff accounts
//! - [`upload`] - menu images

pub mod auth;
pub mod cart;
pub mod health;
pub mod logging;
pub mod menus;
pub mod orders;
pub mod payment;
pub mod restaurant;
pub mod reviews;
pub mod tables;
pub mod upload;
pub mod users;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(restaurant::router())
        .merge(menus::router())
        .merge(tables::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payment::router())
        .merge(reviews::router())
        .merge(users::router())
        .merge(upload::router())
}

/// Fully configured application, used by the server and by tests
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    build_router()
        // JWT authentication, injects CurrentUser for the permission layers
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Outermost: the id exists before anything logs
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}
