//! Background consumption of participant response topics.

use std::sync::Arc;

use messaging::{BusError, MessageBus, Subscription, topics};
use order_store::OrderStore;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::handlers::{ApprovalResponseHandler, PaymentResponseHandler, RefundResponseHandler};

/// Subscribes to the three response topics and dispatches each message to the
/// matching handler.
///
/// A malformed payload is logged and skipped rather than crashing the loop,
/// and handler errors do not stop consumption. Each topic runs in its own
/// task; dropping the returned handles via [`ResponseListener::shutdown`]
/// stops them.
pub struct ResponseListener {
    tasks: Vec<JoinHandle<()>>,
}

impl ResponseListener {
    /// Starts one consumer task per response topic.
    pub async fn start<S, B>(store: Arc<S>, bus: &B) -> Result<Self, BusError>
    where
        S: OrderStore + 'static,
        B: MessageBus + ?Sized,
    {
        let payment = Arc::new(PaymentResponseHandler::new(store.clone()));
        let approval = Arc::new(ApprovalResponseHandler::new(store.clone()));
        let refund = Arc::new(RefundResponseHandler::new(store));

        let payment_sub = bus.subscribe(topics::PAYMENT_RESPONSE).await?;
        let approval_sub = bus.subscribe(topics::APPROVAL_RESPONSE).await?;
        let refund_sub = bus.subscribe(topics::REFUND_RESPONSE).await?;

        let tasks = vec![
            tokio::spawn(consume(payment_sub, topics::PAYMENT_RESPONSE, move |event| {
                let handler = payment.clone();
                async move { handler.handle(event).await.map(|_| ()) }
            })),
            tokio::spawn(consume(
                approval_sub,
                topics::APPROVAL_RESPONSE,
                move |event| {
                    let handler = approval.clone();
                    async move { handler.handle(event).await.map(|_| ()) }
                },
            )),
            tokio::spawn(consume(refund_sub, topics::REFUND_RESPONSE, move |event| {
                let handler = refund.clone();
                async move { handler.handle(event).await.map(|_| ()) }
            })),
        ];

        Ok(Self { tasks })
    }

    /// Stops all consumer tasks.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

async fn consume<E, F, Fut>(mut subscription: Subscription, topic: &'static str, handle: F)
where
    E: DeserializeOwned,
    F: Fn(E) -> Fut,
    Fut: Future<Output = Result<(), crate::SagaError>>,
{
    loop {
        match subscription.recv().await {
            Ok(message) => {
                let event: E = match serde_json::from_value(message.body) {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!(topic, %error, "discarding malformed response payload");
                        metrics::counter!("saga_malformed_responses_total", "topic" => topic)
                            .increment(1);
                        continue;
                    }
                };
                if let Err(error) = handle(event).await {
                    tracing::error!(topic, %error, "response handler failed");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(topic, skipped, "response consumer lagged behind the bus");
            }
            Err(RecvError::Closed) => {
                tracing::info!(topic, "response topic closed, stopping consumer");
                break;
            }
        }
    }
}
