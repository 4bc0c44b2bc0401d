use std::sync::Arc;

use order_store::OrderStore;

use crate::error::SagaError;
use crate::events::{RefundOutcome, RefundResponse};
use crate::guard::HandleOutcome;
use crate::handlers::run_transition;

/// Settles orders parked in `CANCELLING` once the refund participant
/// confirms the money moved back. A failed refund leaves the order parked
/// so the participant's retry can still settle it later.
pub struct RefundResponseHandler<S> {
    store: Arc<S>,
}

impl<S: OrderStore> RefundResponseHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, response), fields(saga_id = %response.saga_id))]
    pub async fn handle(&self, response: RefundResponse) -> Result<HandleOutcome, SagaError> {
        let saga_id = response.saga_id;
        match response.outcome {
            RefundOutcome::Confirmed => {
                let reasons = response.failure_messages;
                run_transition(
                    self.store.as_ref(),
                    saga_id,
                    "finalize_cancel",
                    |status| status.can_finalize_cancel(),
                    |order| {
                        order.finalize_cancel(&reasons)?;
                        Ok(None)
                    },
                )
                .await
            }
            RefundOutcome::Failed => {
                tracing::warn!(
                    %saga_id,
                    messages = ?response.failure_messages,
                    "refund attempt failed, order stays in CANCELLING"
                );
                Ok(HandleOutcome::Dropped)
            }
        }
    }
}
