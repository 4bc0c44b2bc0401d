//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions are monotonic:
/// ```text
/// Pending ──► Paid ──► Approved ──► Completed
///    │          │
///    └──────────┴──► Cancelling ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, payment not yet confirmed.
    #[default]
    Pending,

    /// Payment confirmed, awaiting restaurant approval.
    Paid,

    /// Restaurant approved, order is being fulfilled.
    Approved,

    /// Order fulfilled (terminal).
    Completed,

    /// Cancellation in progress, awaiting compensation to settle.
    Cancelling,

    /// Cancellation settled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if payment confirmation can be applied.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if restaurant approval can be applied.
    pub fn can_approve(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if fulfillment can complete the order.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Approved)
    }

    /// Returns true if cancellation can be initiated.
    pub fn can_initiate_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    /// Returns true if a pending cancellation can be finalized.
    pub fn can_finalize_cancel(&self) -> bool {
        matches!(self, OrderStatus::Cancelling)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored and shared externally.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelling => "CANCELLING",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PAID" => Some(OrderStatus::Paid),
            "APPROVED" => Some(OrderStatus::Approved),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLING" => Some(OrderStatus::Cancelling),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
