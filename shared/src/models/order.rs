//! Order Model

use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One priced line of an order, frozen at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: i64,
    pub name: String,
    /// Unit price at checkout time
    pub price: i64,
    pub quantity: i32,
}

impl OrderLine {
    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub table_number: i32,
    pub items: Vec<OrderLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Identifier the payment gateway knows this order by
    pub gateway_order_id: String,
    #[serde(default)]
    pub payment_token: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    /// Last raw transaction status reported by the gateway
    #[serde(default)]
    pub gateway_status: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Sum of line subtotals
    pub fn compute_total(items: &[OrderLine]) -> i64 {
        items.iter().map(OrderLine::subtotal).sum()
    }
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub table_id: i64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub customer_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub customer_phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
}

/// Staff status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

/// Customer completion payload (served → done plus a review)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteOrderRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Order list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
}

/// Transaction history window (ms timestamps, inclusive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}
