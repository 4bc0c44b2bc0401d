use std::sync::Arc;

use common::TrackingId;
use order_store::OrderStore;

use crate::error::SagaError;
use crate::guard::HandleOutcome;
use crate::handlers::run_transition;

/// Closes the happy path: an approved order that has been handed to the
/// courier is marked `COMPLETED`.
pub struct FulfillmentHandler<S> {
    store: Arc<S>,
}

impl<S: OrderStore> FulfillmentHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, saga_id: TrackingId) -> Result<HandleOutcome, SagaError> {
        run_transition(
            self.store.as_ref(),
            saga_id,
            "complete",
            |status| status.can_complete(),
            |order| {
                order.complete()?;
                Ok(None)
            },
        )
        .await
    }
}
