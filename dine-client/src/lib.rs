//! Dine Client - HTTP client and pollers for the Dine server
//!
//! - [`HttpClient`] - typed REST calls
//! - [`Poller`] - fixed-interval polling with a single in-flight fetch
//! - [`OrderStatusWatcher`] / [`TransactionFeed`] - the customer status
//!   page and the admin transaction view

pub mod config;
pub mod error;
pub mod http;
pub mod poller;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use poller::{
    OrderStatusWatcher, PollSource, Poller, TransactionFeed, Visibility, VisibilityHandle,
};

// Re-export shared types for convenience
pub use shared::client::{CompletedOrder, LoginResponse, NotificationAck, UserInfo};
