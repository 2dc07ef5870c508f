//! Order lifecycle
//!
//! The status enum, the events that move an order between statuses and the
//! table of legal edges. Both the server (to enforce) and the client (to
//! render progress) depend on it.

mod status;

pub use status::{
    NoSuchEdge, OrderEvent, OrderStatus, ParseStatusError, TRANSITIONS, TransitionError,
};
