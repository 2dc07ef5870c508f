//! Permission definitions
//!
//! Roles map to fixed permission sets. Customers never authenticate; their
//! routes are listed in [`super::middleware::PUBLIC_ROUTES`].

use shared::models::Role;

pub const MENU_MANAGE: &str = "menu:manage";
pub const TABLES_READ: &str = "tables:read";
pub const TABLES_MANAGE: &str = "tables:manage";
pub const CART_MANAGE: &str = "cart:manage";
pub const ORDERS_MANAGE: &str = "orders:manage";
pub const REVIEWS_READ: &str = "reviews:read";
pub const REVIEWS_MANAGE: &str = "reviews:manage";
pub const RESTAURANT_MANAGE: &str = "restaurant:manage";
pub const USERS_MANAGE: &str = "users:manage";

/// Every grantable permission
pub const ALL_PERMISSIONS: &[&str] = &[
    MENU_MANAGE,
    TABLES_READ,
    TABLES_MANAGE,
    CART_MANAGE,
    ORDERS_MANAGE,
    REVIEWS_READ,
    REVIEWS_MANAGE,
    RESTAURANT_MANAGE,
    USERS_MANAGE,
];

pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// Floor staff: run the kitchen queue, look up tables and reviews
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] =
    &[ORDERS_MANAGE, TABLES_READ, CART_MANAGE, REVIEWS_READ];

/// Permissions carried in the token for a role
pub fn permissions_for(role: Role) -> Vec<String> {
    let set = match role {
        Role::Admin => DEFAULT_ADMIN_PERMISSIONS,
        Role::Staff => DEFAULT_STAFF_PERMISSIONS,
    };
    set.iter().map(|s| s.to_string()).collect()
}
