//! Cart Repository
//!
//! One record per table at `cart:<table_id>`, created lazily on first write.
//! Writes are read-modify-write with no version check: the last writer wins.

use super::{BaseRepository, RepoError, RepoResult, thing};
use crate::db::models::{Cart, CartItem};
use shared::order::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Cart for a table; a missing cart reads as empty
    pub async fn get(&self, table_id: i64) -> RepoResult<Cart> {
        let carts: Vec<Cart> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM $thing")
            .bind(("thing", thing(TABLE, table_id)))
            .await?
            .take(0)?;
        Ok(carts
            .into_iter()
            .next()
            .unwrap_or_else(|| Cart::empty(table_id)))
    }

    async fn save(&self, mut cart: Cart) -> RepoResult<Cart> {
        cart.updated_at = shared::util::now_millis();
        self.base
            .db()
            .query("UPSERT $thing CONTENT $cart RETURN NONE")
            .bind(("thing", thing(TABLE, cart.table_id)))
            .bind(("cart", cart.clone()))
            .await?
            .check()?;
        Ok(cart)
    }

    /// Append a line or bump the quantity of an existing one
    pub async fn add(&self, table_id: i64, item: CartItem) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        cart.add(item);
        self.save(cart).await
    }

    /// Set quantity; `<= 0` removes the line
    pub async fn update_quantity(
        &self,
        table_id: i64,
        item_id: i64,
        quantity: i32,
    ) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        if !cart.set_quantity(item_id, quantity) {
            return Err(RepoError::NotFound(format!(
                "Item {item_id} is not in the cart of table {table_id}"
            )));
        }
        self.save(cart).await
    }

    pub async fn remove(&self, table_id: i64, item_id: i64) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        cart.remove(item_id);
        self.save(cart).await
    }

    /// Empty the cart and reset the queue marker
    pub async fn clear(&self, table_id: i64) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        cart.clear();
        self.save(cart).await
    }

    /// Mark the cart as waiting in the kitchen queue
    pub async fn activate(&self, table_id: i64) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        cart.activate();
        self.save(cart).await
    }

    /// Mirror the kitchen progress of an active cart; inactive carts are left alone
    pub async fn track(&self, table_id: i64, status: OrderStatus) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        if !cart.is_active {
            return Ok(cart);
        }
        cart.queue_status = Some(status);
        self.save(cart).await
    }

    /// Leave the queue without touching the items
    pub async fn deactivate(&self, table_id: i64) -> RepoResult<Cart> {
        let mut cart = self.get(table_id).await?;
        cart.is_active = false;
        cart.queue_status = None;
        self.save(cart).await
    }

    /// Drop the record entirely (table deleted)
    pub async fn delete(&self, table_id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, table_id).await
    }
}
