//! Precondition guard for at-least-once delivery.
//!
//! The transport may redeliver any response, and responses may arrive out of
//! order. Instead of tracking consumed message ids, every handler checks the
//! order's current status before acting: a response whose precondition does
//! not hold is a duplicate or a straggler and is absorbed without a write.

use common::TrackingId;
use domain::OrderStatus;

/// What a handler did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The transition committed; the order now has this status.
    Applied(OrderStatus),
    /// The precondition did not hold, or the write lost a version race twice.
    /// The response was absorbed without any state change.
    Dropped,
}

impl HandleOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, HandleOutcome::Applied(_))
    }
}

/// Records a dropped response in the audit log and the drop counter.
pub(crate) fn note_dropped(saga_id: TrackingId, action: &'static str, current: OrderStatus) {
    tracing::info!(
        %saga_id,
        action,
        current_status = current.as_str(),
        "dropping response whose precondition no longer holds"
    );
    metrics::counter!("saga_events_dropped_total", "action" => action).increment(1);
}
