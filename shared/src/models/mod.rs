//! Data models
//!
//! Shared between dine-server and dine-client (via API).
//! All IDs are `i64` snowflake keys, money is `i64` in the gateway's
//! currency unit, timestamps are Unix milliseconds.

pub mod cart;
pub mod dining_table;
pub mod menu;
pub mod order;
pub mod restaurant;
pub mod review;
pub mod user;

// Re-exports
pub use cart::*;
pub use dining_table::*;
pub use menu::*;
pub use order::*;
pub use restaurant::*;
pub use review::*;
pub use user::*;
