//! Cart Model

use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Upper bound for one cart line
pub const MAX_LINE_QUANTITY: i32 = 999;

/// Per-table cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub table_id: i64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub queue_status: Option<OrderStatus>,
    #[serde(default)]
    pub updated_at: i64,
}

impl Cart {
    /// Empty cart for a table that has none stored yet
    pub fn empty(table_id: i64) -> Self {
        Self {
            table_id,
            items: Vec::new(),
            is_active: false,
            queue_status: None,
            updated_at: 0,
        }
    }

    /// Add a line, or bump the quantity of an existing one (capped at
    /// [`MAX_LINE_QUANTITY`])
    pub fn add(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|i| i.item_id == item.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(item.quantity)
                    .min(MAX_LINE_QUANTITY);
            }
            None => self.items.push(CartItem {
                quantity: item.quantity.min(MAX_LINE_QUANTITY),
                ..item
            }),
        }
    }

    /// Set a line's quantity; `quantity <= 0` removes it.
    ///
    /// Returns `false` when the item is not in the cart and would need to
    /// be set to a positive quantity.
    pub fn set_quantity(&mut self, item_id: i64, quantity: i32) -> bool {
        if quantity <= 0 {
            self.remove(item_id);
            return true;
        }
        match self.items.iter_mut().find(|i| i.item_id == item_id) {
            Some(existing) => {
                existing.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, item_id: i64) {
        self.items.retain(|i| i.item_id != item_id);
    }

    /// Empty the cart and drop the queue marker
    pub fn clear(&mut self) {
        self.items.clear();
        self.is_active = false;
        self.queue_status = None;
    }

    /// Mark the cart as belonging to a paid order waiting in the kitchen queue
    pub fn activate(&mut self) {
        self.is_active = true;
        self.queue_status = Some(OrderStatus::Queue);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total at cart prices (display only, checkout re-prices)
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.price * i64::from(i.quantity))
            .sum()
    }
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCartItem {
    pub item_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    /// Defaults to 1
    #[serde(default)]
    #[validate(range(min = 1, max = 999))]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<AddCartItem> for CartItem {
    fn from(req: AddCartItem) -> Self {
        Self {
            item_id: req.item_id,
            name: req.name,
            price: req.price,
            quantity: req.quantity.unwrap_or(1),
            image_url: req.image_url,
        }
    }
}

/// Quantity update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, price: i64) -> CartItem {
        CartItem {
            item_id: id,
            name: format!("item-{id}"),
            price,
            quantity: 1,
            image_url: None,
        }
    }

    #[test]
    fn test_add_twice_increments() {
        let mut cart = Cart::empty(1);
        cart.add(item(7, 10_000));
        cart.add(item(7, 10_000));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.total(), 20_000);
    }

    #[test]
    fn test_line_quantity_is_capped() {
        let mut cart = Cart::empty(1);
        cart.add(CartItem {
            quantity: 900,
            ..item(7, 1_000)
        });
        cart.add(CartItem {
            quantity: 900,
            ..item(7, 1_000)
        });
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);

        cart.add(CartItem {
            quantity: i32::MAX,
            ..item(7, 1_000)
        });
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);

        assert!(cart.set_quantity(7, 5_000));
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::empty(1);
        cart.add(item(7, 10_000));
        assert!(cart.set_quantity(7, 5));
        assert_eq!(cart.items[0].quantity, 5);
        assert!(cart.set_quantity(7, 0));
        assert!(cart.is_empty());
        // Absent item with positive quantity is rejected, removal is a no-op
        assert!(!cart.set_quantity(9, 2));
        assert!(cart.set_quantity(9, -1));
    }

    #[test]
    fn test_clear_resets_queue_marker() {
        let mut cart = Cart::empty(3);
        cart.add(item(1, 1));
        cart.activate();
        assert!(cart.is_active);
        assert_eq!(cart.queue_status, Some(OrderStatus::Queue));
        cart.clear();
        assert!(cart.is_empty());
        assert!(!cart.is_active);
        assert_eq!(cart.queue_status, None);
    }
}
