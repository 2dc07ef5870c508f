//! Order lifecycle state machine
//!
//! ```text
//! pending ──PaymentSettled──▶ queue ──StartCooking──▶ cooking ──Serve──▶ served ──Complete──▶ done
//!    │
//!    ├──PaymentPending──▶ pending
//!    ├──PaymentCancelled──▶ cancelled
//!    └──PaymentFailed──▶ failed
//! ```
//!
//! Every legal edge is listed in [`TRANSITIONS`]. Anything else is a
//! [`TransitionError`], there is no fallthrough.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, waiting for the gateway
    Pending,
    /// Paid, waiting for the kitchen
    Queue,
    Cooking,
    Served,
    /// Customer confirmed the meal
    Done,
    /// Gateway denied, cancelled or expired the transaction
    Cancelled,
    /// Gateway reported a failure
    Failed,
}

/// Something that happened to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentPending,
    PaymentSettled,
    PaymentCancelled,
    PaymentFailed,
    StartCooking,
    Serve,
    Complete,
}

/// The complete transition table: `(from, event, to)`.
pub const TRANSITIONS: &[(OrderStatus, OrderEvent, OrderStatus)] = &[
    (OrderStatus::Pending, OrderEvent::PaymentPending, OrderStatus::Pending),
    (OrderStatus::Pending, OrderEvent::PaymentSettled, OrderStatus::Queue),
    (OrderStatus::Pending, OrderEvent::PaymentCancelled, OrderStatus::Cancelled),
    (OrderStatus::Pending, OrderEvent::PaymentFailed, OrderStatus::Failed),
    (OrderStatus::Queue, OrderEvent::StartCooking, OrderStatus::Cooking),
    (OrderStatus::Cooking, OrderEvent::Serve, OrderStatus::Served),
    (OrderStatus::Served, OrderEvent::Complete, OrderStatus::Done),
];

/// Illegal `(status, event)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event} to an order in status {from}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub event: OrderEvent,
}

/// Target status requested for which no edge exists from the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transition from {from} to {to}")]
pub struct NoSuchEdge {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Queue,
        OrderStatus::Cooking,
        OrderStatus::Served,
        OrderStatus::Done,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Queue => "queue",
            OrderStatus::Cooking => "cooking",
            OrderStatus::Served => "served",
            OrderStatus::Done => "done",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    /// Apply an event, returning the next status.
    pub fn apply(self, event: OrderEvent) -> Result<OrderStatus, TransitionError> {
        TRANSITIONS
            .iter()
            .find(|(from, ev, _)| *from == self && *ev == event)
            .map(|(_, _, to)| *to)
            .ok_or(TransitionError { from: self, event })
    }

    /// Find the staff event that moves `self` to `target`.
    ///
    /// Only kitchen events (`StartCooking`, `Serve`) qualify; payment and
    /// completion edges belong to the gateway and the customer.
    pub fn staff_event_to(self, target: OrderStatus) -> Result<OrderEvent, NoSuchEdge> {
        TRANSITIONS
            .iter()
            .find(|(from, ev, to)| *from == self && *to == target && ev.is_staff_action())
            .map(|(_, ev, _)| *ev)
            .ok_or(NoSuchEdge {
                from: self,
                to: target,
            })
    }

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        !TRANSITIONS.iter().any(|(from, _, to)| from == self && to != self)
    }

    /// Paid and not yet finished (drives the customer status page)
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            OrderStatus::Queue | OrderStatus::Cooking | OrderStatus::Served
        )
    }

    /// Hard deletion is permitted only before payment
    pub fn is_deletable(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

impl OrderEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::PaymentPending => "payment_pending",
            OrderEvent::PaymentSettled => "payment_settled",
            OrderEvent::PaymentCancelled => "payment_cancelled",
            OrderEvent::PaymentFailed => "payment_failed",
            OrderEvent::StartCooking => "start_cooking",
            OrderEvent::Serve => "serve",
            OrderEvent::Complete => "complete",
        }
    }

    pub fn is_payment(&self) -> bool {
        matches!(
            self,
            OrderEvent::PaymentPending
                | OrderEvent::PaymentSettled
                | OrderEvent::PaymentCancelled
                | OrderEvent::PaymentFailed
        )
    }

    pub fn is_staff_action(&self) -> bool {
        matches!(self, OrderEvent::StartCooking | OrderEvent::Serve)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised status string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

impl From<TransitionError> for crate::error::AppError {
    fn from(e: TransitionError) -> Self {
        crate::error::AppError::with_message(
            crate::error::ErrorCode::InvalidStatusTransition,
            e.to_string(),
        )
        .with_detail("from", e.from.as_str())
        .with_detail("event", e.event.as_str())
    }
}

impl From<NoSuchEdge> for crate::error::AppError {
    fn from(e: NoSuchEdge) -> Self {
        crate::error::AppError::with_message(
            crate::error::ErrorCode::InvalidStatusTransition,
            e.to_string(),
        )
        .with_detail("from", e.from.as_str())
        .with_detail("to", e.to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EVENTS: [OrderEvent; 7] = [
        OrderEvent::PaymentPending,
        OrderEvent::PaymentSettled,
        OrderEvent::PaymentCancelled,
        OrderEvent::PaymentFailed,
        OrderEvent::StartCooking,
        OrderEvent::Serve,
        OrderEvent::Complete,
    ];

    #[test]
    fn test_happy_path() {
        let mut status = OrderStatus::Pending;
        for event in [
            OrderEvent::PaymentPending,
            OrderEvent::PaymentSettled,
            OrderEvent::StartCooking,
            OrderEvent::Serve,
            OrderEvent::Complete,
        ] {
            status = status.apply(event).unwrap();
        }
        assert_eq!(status, OrderStatus::Done);
    }

    #[test]
    fn test_gateway_exits_only_from_pending() {
        assert_eq!(
            OrderStatus::Pending.apply(OrderEvent::PaymentCancelled),
            Ok(OrderStatus::Cancelled)
        );
        assert_eq!(
            OrderStatus::Pending.apply(OrderEvent::PaymentFailed),
            Ok(OrderStatus::Failed)
        );
        for from in [OrderStatus::Queue, OrderStatus::Cooking, OrderStatus::Served] {
            assert!(from.apply(OrderEvent::PaymentCancelled).is_err());
            assert!(from.apply(OrderEvent::PaymentFailed).is_err());
            assert!(from.apply(OrderEvent::PaymentSettled).is_err());
        }
    }

    #[test]
    fn test_only_listed_edges_are_legal() {
        for from in OrderStatus::ALL {
            for event in ALL_EVENTS {
                let listed = TRANSITIONS.iter().any(|(f, e, _)| *f == from && *e == event);
                assert_eq!(from.apply(event).is_ok(), listed, "{from} + {event}");
            }
        }
    }

    #[test]
    fn test_pending_never_reaches_done_in_one_step() {
        for event in ALL_EVENTS {
            assert_ne!(OrderStatus::Pending.apply(event), Ok(OrderStatus::Done));
        }
        assert!(OrderStatus::Pending.staff_event_to(OrderStatus::Done).is_err());
    }

    #[test]
    fn test_staff_cannot_skip_or_settle() {
        assert_eq!(
            OrderStatus::Queue.staff_event_to(OrderStatus::Cooking),
            Ok(OrderEvent::StartCooking)
        );
        assert_eq!(
            OrderStatus::Cooking.staff_event_to(OrderStatus::Served),
            Ok(OrderEvent::Serve)
        );
        assert!(OrderStatus::Queue.staff_event_to(OrderStatus::Served).is_err());
        assert!(OrderStatus::Pending.staff_event_to(OrderStatus::Queue).is_err());
        assert!(OrderStatus::Served.staff_event_to(OrderStatus::Done).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Done.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Served.is_terminal());
    }

    #[test]
    fn test_only_pending_is_deletable() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_deletable(), status == OrderStatus::Pending);
        }
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("cooking".parse::<OrderStatus>(), Ok(OrderStatus::Cooking));
        assert_eq!(" QUEUE ".parse::<OrderStatus>(), Ok(OrderStatus::Queue));
        assert!("settlement".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Served).unwrap(),
            "\"served\""
        );
    }

    #[test]
    fn test_transition_error_maps_to_app_error() {
        let err: crate::error::AppError = OrderStatus::Done
            .apply(OrderEvent::StartCooking)
            .unwrap_err()
            .into();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidStatusTransition);
        assert_eq!(err.details.unwrap().get("from").unwrap(), "done");
    }
}
