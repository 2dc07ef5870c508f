//! Payment API Handlers
//!
//! Responses are always a `NotificationAck`; the gateway only looks at the
//! HTTP status to decide whether to retry.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use shared::client::NotificationAck;

use crate::core::ServerState;
use crate::orders::lifecycle::order_not_found;
use crate::orders::{Reconciler, Source};
use crate::services::GatewayNotification;
use crate::utils::{AppError, ErrorCode};

type AckResponse = (StatusCode, Json<NotificationAck>);

fn failure(err: AppError) -> AckResponse {
    let status = err.http_status();
    if status.is_server_error() {
        tracing::error!(code = %err.code, message = %err.message, "Payment notification failed");
    } else {
        tracing::warn!(code = %err.code, message = %err.message, "Payment notification rejected");
    }
    (
        status,
        Json(NotificationAck {
            success: false,
            status: None,
            message: Some(err.message),
        }),
    )
}

/// POST /api/payment/notification
pub async fn notification(State(state): State<ServerState>, body: Bytes) -> AckResponse {
    let notification: GatewayNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            return failure(AppError::with_message(
                ErrorCode::InvalidNotification,
                format!("Malformed notification body: {e}"),
            ));
        }
    };

    let reconciler = Reconciler::new(state.db.clone(), state.config.midtrans.clone());
    match reconciler.reconcile(notification, Source::Webhook).await {
        Ok(ack) => (StatusCode::OK, Json(ack)),
        Err(e) => failure(e),
    }
}

/// GET /api/payment/status/{order_id} - manual refresh for a missed webhook
pub async fn refresh_status(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> AckResponse {
    let order = match crate::db::repository::OrderRepository::new(state.db.clone())
        .find_by_id(order_id)
        .await
    {
        Ok(Some(order)) => order,
        Ok(None) => return failure(order_not_found(order_id)),
        Err(e) => return failure(e.into()),
    };

    let status = match state.gateway.transaction_status(&order.gateway_order_id).await {
        Ok(status) => status,
        Err(e) => return failure(e.into()),
    };

    let reconciler = Reconciler::new(state.db.clone(), state.config.midtrans.clone());
    match reconciler.reconcile(status, Source::StatusQuery).await {
        Ok(ack) => (StatusCode::OK, Json(ack)),
        Err(e) => failure(e),
    }
}
