//! Payment gateway client (Midtrans Snap + core status API)
//!
//! Plain REST over reqwest, no SDK. One attempt per call; callers decide
//! what a failure means for the order.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::core::config::MidtransConfig;
use crate::db::models::Order;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),

    #[error("Payment gateway server key is not configured")]
    NotConfigured,
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        tracing::warn!(error = %err, "Payment gateway call failed");
        AppError::with_message(ErrorCode::PaymentGatewayError, err.to_string())
    }
}

/// Checkout session handed back to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapTransaction {
    pub token: String,
    pub redirect_url: String,
}

/// Transaction state as the gateway reports it, both in webhook
/// notifications and in status queries.
///
/// Every field defaults so malformed bodies reach validation instead of
/// failing in the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayNotification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session for a pending order
    async fn create_transaction(&self, order: &Order) -> Result<SnapTransaction, PaymentError>;

    /// Current state of a transaction, by gateway order id
    async fn transaction_status(
        &self,
        gateway_order_id: &str,
    ) -> Result<GatewayNotification, PaymentError>;
}

// =============================================================================
// Snap request payload
// =============================================================================

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    item_details: Vec<ItemDetail<'a>>,
    customer_details: CustomerDetails<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callbacks: Option<Callbacks<'a>>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct ItemDetail<'a> {
    id: String,
    name: &'a str,
    price: i64,
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Callbacks<'a> {
    finish: &'a str,
}

fn snap_request<'a>(order: &'a Order, finish_url: Option<&'a str>) -> SnapRequest<'a> {
    SnapRequest {
        transaction_details: TransactionDetails {
            order_id: &order.gateway_order_id,
            gross_amount: order.total_amount,
        },
        item_details: order
            .items
            .iter()
            .map(|line| ItemDetail {
                id: line.item_id.to_string(),
                // Midtrans caps item names at 50 chars
                name: truncate(&line.name, 50),
                price: line.price,
                quantity: line.quantity,
            })
            .collect(),
        customer_details: CustomerDetails {
            first_name: order
                .customer_name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("Guest"),
            phone: order.customer_phone.as_deref(),
        },
        callbacks: finish_url.map(|finish| Callbacks { finish }),
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// Midtrans
// =============================================================================

pub struct MidtransGateway {
    client: reqwest::Client,
    config: MidtransConfig,
}

impl MidtransGateway {
    pub fn new(config: MidtransConfig, timeout: Duration) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn ensure_configured(&self) -> Result<(), PaymentError> {
        if self.config.server_key.is_empty() {
            return Err(PaymentError::NotConfigured);
        }
        Ok(())
    }

    /// Turn a non-2xx body into a readable message
    async fn rejection(resp: reqwest::Response) -> PaymentError {
        let status = resp.status().as_u16();
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        let message = body["error_messages"]
            .as_array()
            .map(|msgs| {
                msgs.iter()
                    .filter_map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .or_else(|| body["status_message"].as_str().map(String::from))
            .unwrap_or_else(|| "no error message".to_string());
        PaymentError::Rejected { status, message }
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_transaction(&self, order: &Order) -> Result<SnapTransaction, PaymentError> {
        self.ensure_configured()?;
        let url = format!("{}/snap/v1/transactions", self.config.snap_base_url());
        let payload = snap_request(order, self.config.finish_url.as_deref());

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.server_key, None::<&str>)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let tx: SnapTransaction = resp
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
        tracing::info!(
            gateway_order_id = %order.gateway_order_id,
            gross_amount = order.total_amount,
            "Snap transaction created"
        );
        Ok(tx)
    }

    async fn transaction_status(
        &self,
        gateway_order_id: &str,
    ) -> Result<GatewayNotification, PaymentError> {
        self.ensure_configured()?;
        let url = format!(
            "{}/v2/{}/status",
            self.config.api_base_url(),
            gateway_order_id
        );

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.config.server_key, None::<&str>)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let status: GatewayNotification = resp
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
        if status.transaction_status.is_empty() {
            // The status API answers 200 with a 404 status_code for unknown ids
            return Err(PaymentError::Rejected {
                status: status
                    .status_code
                    .as_deref()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(404),
                message: format!("No transaction for {gateway_order_id}"),
            });
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::OrderLine;
    use shared::order::OrderStatus;

    fn order() -> Order {
        Order {
            id: 1,
            table_id: 10,
            table_number: 3,
            items: vec![OrderLine {
                item_id: 7,
                name: "Nasi Goreng Spesial Dengan Telur Mata Sapi Dan Kerupuk Udang".into(),
                price: 25_000,
                quantity: 2,
            }],
            total_amount: 50_000,
            status: OrderStatus::Pending,
            payment_method: None,
            customer_name: None,
            customer_phone: Some("0812".into()),
            gateway_order_id: "ORDER-1".into(),
            payment_token: None,
            payment_url: None,
            gateway_status: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_snap_payload_shape() {
        let o = order();
        let json = serde_json::to_value(snap_request(&o, Some("https://x/finish"))).unwrap();
        assert_eq!(json["transaction_details"]["order_id"], "ORDER-1");
        assert_eq!(json["transaction_details"]["gross_amount"], 50_000);
        assert_eq!(json["item_details"][0]["id"], "7");
        assert_eq!(json["item_details"][0]["quantity"], 2);
        assert_eq!(
            json["item_details"][0]["name"].as_str().unwrap().chars().count(),
            50
        );
        assert_eq!(json["customer_details"]["first_name"], "Guest");
        assert_eq!(json["customer_details"]["phone"], "0812");
        assert_eq!(json["callbacks"]["finish"], "https://x/finish");
    }

    #[test]
    fn test_snap_payload_without_callbacks() {
        let o = order();
        let json = serde_json::to_value(snap_request(&o, None)).unwrap();
        assert!(json.get("callbacks").is_none());
    }

    #[test]
    fn test_notification_tolerates_missing_fields() {
        let n: GatewayNotification = serde_json::from_str(r#"{"order_id":"A"}"#).unwrap();
        assert_eq!(n.order_id, "A");
        assert!(n.transaction_status.is_empty());
        assert!(n.fraud_status.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_fails_fast() {
        let gw = MidtransGateway::new(
            MidtransConfig {
                server_key: String::new(),
                is_production: false,
                verify_signature: false,
                finish_url: None,
            },
            Duration::from_secs(1),
        )
        .unwrap();
        let err = gw.create_transaction(&order()).await.unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::PaymentGatewayError);
    }
}
