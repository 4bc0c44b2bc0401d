//! One handler per saga step.
//!
//! Response handlers share a single transition runner: load the order, check
//! the step precondition, apply the domain transition, and commit it together
//! with the next outbox record under the version read at load time. A version
//! conflict triggers one re-read and retry; a second conflict means a
//! concurrent handler already consumed an equivalent response, so the event
//! is dropped.

mod approval_response;
mod create_order;
mod fulfillment;
mod payment_response;
mod refund_response;

pub use approval_response::ApprovalResponseHandler;
pub use create_order::CreateOrderHandler;
pub use fulfillment::FulfillmentHandler;
pub use payment_response::PaymentResponseHandler;
pub use refund_response::RefundResponseHandler;

use common::TrackingId;
use domain::{Order, OrderStatus};
use order_store::{OrderStore, OutboxRecord, UpdateOutcome};

use crate::error::SagaError;
use crate::guard::{self, HandleOutcome};

/// Runs one guarded, optimistically concurrent order transition.
pub(crate) async fn run_transition<S, P, A>(
    store: &S,
    saga_id: TrackingId,
    action: &'static str,
    precondition: P,
    mut apply: A,
) -> Result<HandleOutcome, SagaError>
where
    S: OrderStore + ?Sized,
    P: Fn(OrderStatus) -> bool,
    A: FnMut(&mut Order) -> Result<Option<OutboxRecord>, SagaError>,
{
    let mut order = store
        .find_by_tracking_id(saga_id)
        .await?
        .ok_or(SagaError::OrderNotFound(saga_id))?;

    for attempt in 0..2u32 {
        if !precondition(order.status()) {
            guard::note_dropped(saga_id, action, order.status());
            return Ok(HandleOutcome::Dropped);
        }

        let expected_version = order.version();
        let mut next = order.clone();
        let record = apply(&mut next)?;

        match store
            .update_order(&next, expected_version, record.as_ref())
            .await?
        {
            UpdateOutcome::Updated(version) => {
                tracing::info!(
                    %saga_id,
                    action,
                    status = next.status().as_str(),
                    version = version.as_i64(),
                    "order transition committed"
                );
                metrics::counter!("saga_transitions_total", "action" => action).increment(1);
                return Ok(HandleOutcome::Applied(next.status()));
            }
            UpdateOutcome::Conflict if attempt == 0 => {
                tracing::debug!(%saga_id, action, "version conflict, re-reading order");
                order = store
                    .find_by_tracking_id(saga_id)
                    .await?
                    .ok_or(SagaError::OrderNotFound(saga_id))?;
            }
            UpdateOutcome::Conflict => {
                guard::note_dropped(saga_id, action, order.status());
                return Ok(HandleOutcome::Dropped);
            }
        }
    }

    // Both loop arms return; rustc cannot see that.
    Ok(HandleOutcome::Dropped)
}
