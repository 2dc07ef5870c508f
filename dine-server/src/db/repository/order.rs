//! Order Repository
//!
//! Status writes are conditional on the status the caller observed
//! (`WHERE status = $from`), so two racing writers cannot both succeed.

use super::{BaseRepository, RepoError, RepoResult, thing};
use crate::db::models::{HistoryQuery, Order, OrderQuery, Review};
use shared::order::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "orders";

/// Paid-order side effects, applied with the status change in one transaction
const SETTLE_SQL: &str = r#"
BEGIN TRANSACTION;
LET $updated = (UPDATE $order SET status = 'queue', gateway_status = $gateway_status, updated_at = $now WHERE status = 'pending' RETURN AFTER);
IF array::len($updated) == 0 { THROW "order is no longer pending"; };
UPSERT $cart MERGE { table_id: $table_id, items: [], is_active: true, queue_status: 'queue', updated_at: $now };
UPDATE $table SET status = 'occupied', active_order_id = $order_id;
FOR $line IN $lines {
    UPDATE type::thing('menu_item', $line.item_id) SET stock = math::max([stock - $line.quantity, 0]), updated_at = $now;
};
COMMIT TRANSACTION;
"#;

/// `served -> done` and the customer's review, both or neither
const COMPLETE_SQL: &str = r#"
BEGIN TRANSACTION;
LET $updated = (UPDATE $order SET status = 'done', updated_at = $now WHERE status = 'served' RETURN AFTER);
IF array::len($updated) == 0 { THROW "order is no longer served"; };
INSERT INTO review $review RETURN NONE;
COMMIT TRANSACTION;
"#;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Order>> {
        self.base.find_one(TABLE, id).await
    }

    /// Lookup by the id the payment gateway knows
    pub async fn find_by_gateway_id(&self, gateway_order_id: &str) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT *, record::id(id) AS id FROM orders \
                 WHERE gateway_order_id = $gateway_order_id LIMIT 1",
            )
            .bind(("gateway_order_id", gateway_order_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Orders of one table, newest first
    pub async fn find_by_table(&self, table_id: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT *, record::id(id) AS id FROM orders \
                 WHERE table_id = $table_id ORDER BY created_at DESC",
            )
            .bind(("table_id", table_id))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Filtered list, newest first
    pub async fn find_all(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let mut sql = String::from("SELECT *, record::id(id) AS id FROM orders");
        let mut filters = Vec::new();
        if query.status.is_some() {
            filters.push("status = $status");
        }
        if query.table_id.is_some() {
            filters.push("table_id = $table_id");
        }
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let orders: Vec<Order> = self
            .base
            .db()
            .query(sql)
            .bind(("status", query.status))
            .bind(("table_id", query.table_id))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Transaction history window, newest first
    pub async fn history(&self, query: &HistoryQuery) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT *, record::id(id) AS id FROM orders \
                 WHERE created_at >= $from AND created_at <= $to ORDER BY created_at DESC",
            )
            .bind(("from", query.from.unwrap_or(0)))
            .bind(("to", query.to.unwrap_or(i64::MAX)))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let id = order.id;
        self.base.insert(TABLE, order).await?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Store the gateway checkout token and redirect URL
    pub async fn set_payment(&self, id: i64, token: String, url: String) -> RepoResult<Order> {
        self.base
            .db()
            .query("UPDATE $thing SET payment_token = $token, payment_url = $url, updated_at = $now")
            .bind(("thing", thing(TABLE, id)))
            .bind(("token", token))
            .bind(("url", url))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }

    /// Record the raw gateway status without changing the order status
    pub async fn set_gateway_status(&self, id: i64, gateway_status: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET gateway_status = $gateway_status, updated_at = $now")
            .bind(("thing", thing(TABLE, id)))
            .bind(("gateway_status", gateway_status.to_string()))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;
        Ok(())
    }

    /// Move `from -> to`; returns `false` when the stored status was no
    /// longer `from`.
    pub async fn transition(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        gateway_status: Option<&str>,
    ) -> RepoResult<bool> {
        let updated: Vec<i64> = self
            .base
            .db()
            .query(
                "UPDATE $thing SET status = $to, updated_at = $now, \
                 gateway_status = $gateway_status ?? gateway_status \
                 WHERE status = $from RETURN VALUE record::id(id)",
            )
            .bind(("thing", thing(TABLE, id)))
            .bind(("from", from))
            .bind(("to", to))
            .bind(("gateway_status", gateway_status.map(str::to_string)))
            .bind(("now", shared::util::now_millis()))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    /// `pending -> queue` plus cart activation (the paid items leave the
    /// cart), table occupation and stock decrement, all or nothing.
    ///
    /// Returns `false` when the order had already left `pending`.
    pub async fn settle(&self, order: &Order, gateway_status: &str) -> RepoResult<bool> {
        let result = self
            .base
            .db()
            .query(SETTLE_SQL)
            .bind(("order", thing(TABLE, order.id)))
            .bind(("order_id", order.id))
            .bind(("cart", thing(super::cart::TABLE, order.table_id)))
            .bind(("table", thing(super::dining_table::TABLE, order.table_id)))
            .bind(("table_id", order.table_id))
            .bind(("lines", order.items.clone()))
            .bind(("gateway_status", gateway_status.to_string()))
            .bind(("now", shared::util::now_millis()))
            .await
            .and_then(|r| r.check());

        match result {
            Ok(_) => Ok(true),
            Err(e) => self.moved_on(order.id, OrderStatus::Pending, e).await,
        }
    }

    /// `served -> done` together with the review insert.
    ///
    /// Returns `false` when the order had already left `served`; a failed
    /// review write leaves the order `served`.
    pub async fn complete(&self, order: &Order, review: Review) -> RepoResult<bool> {
        let result = self
            .base
            .db()
            .query(COMPLETE_SQL)
            .bind(("order", thing(TABLE, order.id)))
            .bind(("review", review))
            .bind(("now", shared::util::now_millis()))
            .await
            .and_then(|r| r.check());

        match result {
            Ok(_) => Ok(true),
            Err(e) => self.moved_on(order.id, OrderStatus::Served, e).await,
        }
    }

    /// A transaction failed: `Ok(false)` if the order is no longer in
    /// `expected` (lost a race), otherwise the original error
    async fn moved_on(
        &self,
        id: i64,
        expected: OrderStatus,
        err: surrealdb::Error,
    ) -> RepoResult<bool> {
        match self.find_by_id(id).await? {
            Some(o) if o.status != expected => {
                tracing::info!(order_id = id, status = %o.status, "Order already moved, write skipped");
                Ok(false)
            }
            _ => Err(err.into()),
        }
    }

    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, id).await
    }
}
