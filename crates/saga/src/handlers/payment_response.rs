use std::sync::Arc;

use domain::OrderStatus;
use order_store::{OrderStore, OutboxEventType, OutboxRecord};

use crate::error::SagaError;
use crate::events::{PaymentOutcome, PaymentResponse};
use crate::guard::HandleOutcome;
use crate::handlers::run_transition;

/// Applies payment participant verdicts.
///
/// A completed payment moves the order to `PAID` and queues the restaurant
/// approval request. A failed payment cancels the order in a single unit:
/// no money moved, so there is nothing to wait for from the refund
/// participant, but a refund record is still written as the audit trail of
/// the compensation.
pub struct PaymentResponseHandler<S> {
    store: Arc<S>,
}

impl<S: OrderStore> PaymentResponseHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, response), fields(saga_id = %response.saga_id))]
    pub async fn handle(&self, response: PaymentResponse) -> Result<HandleOutcome, SagaError> {
        let saga_id = response.saga_id;
        match response.outcome {
            PaymentOutcome::Completed => {
                run_transition(
                    self.store.as_ref(),
                    saga_id,
                    "pay",
                    |status| status.can_pay(),
                    |order| {
                        order.pay()?;
                        let record =
                            OutboxRecord::for_order(order, OutboxEventType::ApprovalRequest)?;
                        Ok(Some(record))
                    },
                )
                .await
            }
            PaymentOutcome::Failed => {
                let reasons = response.failure_messages;
                run_transition(
                    self.store.as_ref(),
                    saga_id,
                    "cancel_after_payment_failure",
                    |status| status == OrderStatus::Pending,
                    |order| {
                        order.initiate_cancel(&reasons)?;
                        order.finalize_cancel(&[])?;
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
