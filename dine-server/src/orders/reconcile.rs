//! Payment reconciliation
//!
//! Gateway notifications (webhook or manual status refresh) are mapped to
//! lifecycle events and applied to the matching pending order. Anything that
//! arrives after the order left `pending` is acknowledged without effect.

use sha2::{Digest, Sha512};
use shared::client::NotificationAck;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{OrderEvent, OrderStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::config::MidtransConfig;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::orders::lifecycle::order_not_found;
use crate::services::GatewayNotification;
use crate::security_log;

/// What a gateway status means for the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    Event(OrderEvent),
    /// Stored as `gateway_status` only (refunds)
    RecordOnly,
}

/// Gateway vocabulary → lifecycle event
pub fn map_status(transaction_status: &str, fraud_status: Option<&str>) -> Option<GatewayOutcome> {
    let event = match transaction_status.trim().to_ascii_lowercase().as_str() {
        "settlement" => OrderEvent::PaymentSettled,
        "capture" => match fraud_status.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("challenge") => OrderEvent::PaymentPending,
            Some("deny") => OrderEvent::PaymentCancelled,
            _ => OrderEvent::PaymentSettled,
        },
        "pending" | "authorize" => OrderEvent::PaymentPending,
        "deny" | "cancel" | "expire" => OrderEvent::PaymentCancelled,
        "failure" => OrderEvent::PaymentFailed,
        "refund" | "partial_refund" => return Some(GatewayOutcome::RecordOnly),
        _ => return None,
    };
    Some(GatewayOutcome::Event(event))
}

/// `hex(sha512(order_id + status_code + gross_amount + server_key))`
pub fn expected_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

fn signature_matches(n: &GatewayNotification, server_key: &str) -> bool {
    let (Some(status_code), Some(gross_amount), Some(signature)) = (
        n.status_code.as_deref(),
        n.gross_amount.as_deref(),
        n.signature_key.as_deref(),
    ) else {
        return false;
    };
    let expected = expected_signature(&n.order_id, status_code, gross_amount, server_key);
    expected.eq_ignore_ascii_case(signature.trim())
}

/// Where a notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Pushed to the public webhook; signature checked when enabled
    Webhook,
    /// Pulled by us from the authenticated status API
    StatusQuery,
}

pub struct Reconciler {
    orders: OrderRepository,
    config: MidtransConfig,
}

impl Reconciler {
    pub fn new(db: Surreal<Db>, config: MidtransConfig) -> Self {
        Self {
            orders: OrderRepository::new(db),
            config,
        }
    }

    pub async fn reconcile(
        &self,
        notification: GatewayNotification,
        source: Source,
    ) -> AppResult<NotificationAck> {
        let order_id = notification.order_id.trim();
        let raw_status = notification.transaction_status.trim().to_ascii_lowercase();
        if order_id.is_empty() || raw_status.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::InvalidNotification,
                "order_id and transaction_status are required",
            ));
        }

        let outcome = map_status(&raw_status, notification.fraud_status.as_deref())
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::UnknownTransactionStatus,
                    format!("Unknown transaction status '{raw_status}'"),
                )
            })?;

        if source == Source::Webhook
            && self.config.verify_signature
            && !signature_matches(&notification, &self.config.server_key)
        {
            security_log!(
                "WARN",
                "payment_signature_mismatch",
                gateway_order_id = order_id.to_string()
            );
            return Err(AppError::new(ErrorCode::InvalidSignature));
        }

        let order = self
            .orders
            .find_by_gateway_id(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        warn_on_amount_mismatch(&order, notification.gross_amount.as_deref());

        let event = match outcome {
            GatewayOutcome::RecordOnly => {
                self.orders.set_gateway_status(order.id, &raw_status).await?;
                tracing::info!(order_id = order.id, gateway_status = %raw_status, "Gateway status recorded");
                return Ok(ack(order.status, "recorded"));
            }
            GatewayOutcome::Event(event) => event,
        };

        if order.status != OrderStatus::Pending {
            tracing::info!(
                order_id = order.id,
                status = %order.status,
                gateway_status = %raw_status,
                "Duplicate payment notification ignored"
            );
            return Ok(ack(order.status, "already processed"));
        }

        let next = order.status.apply(event)?;
        let applied = match next {
            OrderStatus::Pending => {
                self.orders.set_gateway_status(order.id, &raw_status).await?;
                true
            }
            OrderStatus::Queue => self.orders.settle(&order, &raw_status).await?,
            other => {
                self.orders
                    .transition(order.id, OrderStatus::Pending, other, Some(&raw_status))
                    .await?
            }
        };

        let current = self
            .orders
            .find_by_id(order.id)
            .await?
            .ok_or_else(|| order_not_found(order.id))?;

        if applied {
            tracing::info!(
                order_id = order.id,
                table_id = order.table_id,
                event = event.as_str(),
                status = %current.status,
                "Payment notification applied"
            );
            Ok(ack(current.status, "ok"))
        } else {
            tracing::info!(order_id = order.id, status = %current.status, "Payment notification lost a race, ignored");
            Ok(ack(current.status, "already processed"))
        }
    }
}

fn ack(status: OrderStatus, message: &str) -> NotificationAck {
    NotificationAck {
        success: true,
        status: Some(status),
        message: Some(message.to_string()),
    }
}

fn warn_on_amount_mismatch(order: &Order, gross_amount: Option<&str>) {
    let Some(amount) = gross_amount.and_then(|a| a.trim().parse::<f64>().ok()) else {
        return;
    };
    if (amount - order.total_amount as f64).abs() >= 1.0 {
        tracing::warn!(
            order_id = order.id,
            expected = order.total_amount,
            reported = amount,
            "Gateway gross_amount differs from order total"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_vocabulary() {
        use GatewayOutcome::*;
        assert_eq!(map_status("settlement", None), Some(Event(OrderEvent::PaymentSettled)));
        assert_eq!(map_status("capture", None), Some(Event(OrderEvent::PaymentSettled)));
        assert_eq!(map_status("capture", Some("accept")), Some(Event(OrderEvent::PaymentSettled)));
        assert_eq!(
            map_status("capture", Some("challenge")),
            Some(Event(OrderEvent::PaymentPending))
        );
        assert_eq!(map_status("capture", Some("deny")), Some(Event(OrderEvent::PaymentCancelled)));
        assert_eq!(map_status("pending", None), Some(Event(OrderEvent::PaymentPending)));
        assert_eq!(map_status("authorize", None), Some(Event(OrderEvent::PaymentPending)));
        for s in ["deny", "cancel", "expire"] {
            assert_eq!(map_status(s, None), Some(Event(OrderEvent::PaymentCancelled)));
        }
        assert_eq!(map_status("failure", None), Some(Event(OrderEvent::PaymentFailed)));
        assert_eq!(map_status("refund", None), Some(RecordOnly));
        assert_eq!(map_status("partial_refund", None), Some(RecordOnly));
        assert_eq!(map_status("SETTLEMENT", None), Some(Event(OrderEvent::PaymentSettled)));
        assert_eq!(map_status("paid", None), None);
    }

    #[test]
    fn test_signature() {
        let sig = expected_signature("ORDER-1", "200", "50000.00", "key");
        assert_eq!(sig.len(), 128);

        let n = GatewayNotification {
            order_id: "ORDER-1".into(),
            transaction_status: "settlement".into(),
            status_code: Some("200".into()),
            gross_amount: Some("50000.00".into()),
            signature_key: Some(sig.to_uppercase()),
            ..Default::default()
        };
        assert!(signature_matches(&n, "key"));
        assert!(!signature_matches(&n, "other-key"));

        let unsigned = GatewayNotification {
            signature_key: None,
            ..n
        };
        assert!(!signature_matches(&unsigned, "key"));
    }
}
