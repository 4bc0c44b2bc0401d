//! Wire shapes of the participant responses this service consumes.
//!
//! Every response carries the saga id (the order's tracking id) so the
//! handler can locate the order it belongs to. Failure messages ride along
//! as free-form strings and end up on the order for the customer to see.

use common::TrackingId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Completed,
    Failed,
}

/// Payment participant verdict for one saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub saga_id: TrackingId,
    pub outcome: PaymentOutcome,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
}

/// Restaurant approval verdict for one saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub saga_id: TrackingId,
    pub outcome: ApprovalOutcome,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundOutcome {
    Confirmed,
    Failed,
}

/// Refund confirmation for a saga under compensation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub saga_id: TrackingId,
    pub outcome: RefundOutcome,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}
