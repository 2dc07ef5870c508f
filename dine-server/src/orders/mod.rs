//! Order workflows on top of the repositories
//!
//! - [`checkout`] - cart snapshot to pending order plus payment session
//! - [`lifecycle`] - staff and customer status changes, deletion
//! - [`reconcile`] - payment gateway notifications

pub mod checkout;
pub mod lifecycle;
pub mod reconcile;

pub use checkout::Checkout;
pub use lifecycle::OrderLifecycle;
pub use reconcile::{GatewayOutcome, Reconciler, Source, map_status};
