use std::sync::Arc;

use domain::OrderStatus;
use order_store::{OrderStore, OutboxEventType, OutboxRecord};

use crate::error::SagaError;
use crate::events::{ApprovalOutcome, ApprovalResponse};
use crate::guard::HandleOutcome;
use crate::handlers::run_transition;

/// Applies restaurant approval verdicts.
///
/// Approval moves a paid order to `APPROVED`. Rejection starts compensation:
/// the customer already paid, so the order parks in `CANCELLING` with a
/// refund request queued, and only settles to `CANCELLED` when the refund
/// participant confirms.
pub struct ApprovalResponseHandler<S> {
    store: Arc<S>,
}

impl<S: OrderStore> ApprovalResponseHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, response), fields(saga_id = %response.saga_id))]
    pub async fn handle(&self, response: ApprovalResponse) -> Result<HandleOutcome, SagaError> {
        let saga_id = response.saga_id;
        match response.outcome {
            ApprovalOutcome::Approved => {
                run_transition(
                    self.store.as_ref(),
                    saga_id,
                    "approve",
                    |status| status.can_approve(),
                    |order| {
                        order.approve()?;
                        Ok(None)
                    },
                )
                .await
            }
            ApprovalOutcome::Rejected => {
                let reasons = response.failure_messages;
                run_transition(
                    self.store.as_ref(),
                    saga_id,
                    "cancel_after_rejection",
                    |status| status == OrderStatus::Paid,
                    |order| {
                        order.initiate_cancel(&reasons)?;
                        let record =
                            OutboxRecord::for_order(order, OutboxEventType::RefundRequest)?;
                        Ok(Some(record))
                    },
                )
                .await
            }
        }
    }
}
