//! Checkout: cart snapshot → pending order → gateway checkout session

use std::collections::HashMap;
use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Cart, CheckoutRequest, MenuItem, Order, OrderLine};
use crate::db::repository::{CartRepository, DiningTableRepository, MenuRepository, OrderRepository};
use crate::services::PaymentGateway;

pub struct Checkout {
    carts: CartRepository,
    menu: MenuRepository,
    orders: OrderRepository,
    tables: DiningTableRepository,
    gateway: Arc<dyn PaymentGateway>,
}

impl Checkout {
    pub fn new(db: Surreal<Db>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            carts: CartRepository::new(db.clone()),
            menu: MenuRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone()),
            tables: DiningTableRepository::new(db),
            gateway,
        }
    }

    /// Turn the table's cart into a pending order with a payment session.
    ///
    /// The cart is left as is: its items are cleared when the payment
    /// settles, so a cancelled or expired payment can be retried. If the
    /// gateway fails the pending order is removed again.
    pub async fn run(&self, req: CheckoutRequest) -> AppResult<Order> {
        let table = self.tables.find_by_id(req.table_id).await?.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TableNotFound,
                format!("Table {} not found", req.table_id),
            )
        })?;

        let cart = self.carts.get(table.id).await?;
        if cart.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }

        let ids: Vec<i64> = cart.items.iter().map(|i| i.item_id).collect();
        let menu: HashMap<i64, MenuItem> = self
            .menu
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let items = price_lines(&cart, &menu)?;

        let now = shared::util::now_millis();
        let id = shared::util::snowflake_id();
        let order = Order {
            id,
            table_id: table.id,
            table_number: table.number,
            total_amount: Order::compute_total(&items),
            items,
            status: OrderStatus::Pending,
            payment_method: req.payment_method,
            customer_name: req.customer_name.filter(|n| !n.trim().is_empty()),
            customer_phone: req.customer_phone.filter(|p| !p.trim().is_empty()),
            gateway_order_id: format!("DINE-{}-{id}", table.number),
            payment_token: None,
            payment_url: None,
            gateway_status: None,
            created_at: now,
            updated_at: now,
        };
        let order = self.orders.create(order).await?;

        let session = match self.gateway.create_transaction(&order).await {
            Ok(session) => session,
            Err(e) => {
                if let Err(del) = self.orders.delete(order.id).await {
                    tracing::error!(order_id = order.id, error = %del, "Failed to roll back pending order");
                }
                return Err(e.into());
            }
        };

        let order = self
            .orders
            .set_payment(order.id, session.token, session.redirect_url)
            .await?;

        tracing::info!(
            order_id = order.id,
            table = table.number,
            total = order.total_amount,
            "Order created, awaiting payment"
        );
        Ok(order)
    }
}

/// Re-price cart lines from the menu and check stock
fn price_lines(cart: &Cart, menu: &HashMap<i64, MenuItem>) -> AppResult<Vec<OrderLine>> {
    cart.items
        .iter()
        .map(|line| {
            let item = menu.get(&line.item_id).ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::MenuItemNotFound,
                    format!("Menu item {} ({}) no longer exists", line.item_id, line.name),
                )
            })?;
            if item.stock < line.quantity {
                return Err(AppError::with_message(
                    ErrorCode::MenuItemOutOfStock,
                    format!("Only {} left of {}", item.stock.max(0), item.name),
                )
                .with_detail("item_id", item.id)
                .with_detail("available", item.stock.max(0))
                .with_detail("requested", line.quantity));
            }
            Ok(OrderLine {
                item_id: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: line.quantity,
            })
        })
        .collect()
}
