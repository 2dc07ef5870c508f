//! Shared types for Dine
//!
//! Common types used by both the server and the client: error codes and
//! response envelope, data models, the order lifecycle state machine and
//! small utilities.

pub mod client;
pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use order::{OrderEvent, OrderStatus};
pub use serde::{Deserialize, Serialize};
