use common::TrackingId;
use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

/// Errors surfaced by saga handlers.
///
/// Version conflicts and duplicate responses are not errors; handlers report
/// those as [`crate::HandleOutcome::Dropped`].
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("no order found for tracking id {0}")]
    OrderNotFound(TrackingId),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed response payload: {0}")]
    Payload(#[from] serde_json::Error),
}
