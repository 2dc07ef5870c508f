//! Database Models
//!
//! API-facing records live in `shared::models`; only types that never
//! leave the server are defined here.

pub mod user;

pub use shared::models::*;
pub use user::UserRecord;
