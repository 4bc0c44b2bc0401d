use std::sync::Arc;

use domain::{Order, OrderError};
use order_store::{OrderStore, OutboxEventType, OutboxRecord};

use crate::commands::{CreateOrderCommand, CreatedOrder};
use crate::error::SagaError;

/// Starts a new order saga.
///
/// Validation happens before any write: an invalid command leaves neither an
/// order row nor an outbox record behind. On success the order lands in
/// `PENDING` together with its payment request in one atomic unit.
pub struct CreateOrderHandler<S> {
    store: Arc<S>,
}

impl<S: OrderStore> CreateOrderHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, command), fields(restaurant_id = %command.restaurant_id))]
    pub async fn handle(&self, command: CreateOrderCommand) -> Result<CreatedOrder, SagaError> {
        let restaurant = self
            .store
            .find_restaurant(command.restaurant_id)
            .await?
            .ok_or(SagaError::Order(OrderError::InvalidRestaurant {
                restaurant_id: command.restaurant_id,
                reason: "restaurant is not known",
            }))?;

        let order = Order::initialize(
            command.customer_id,
            &restaurant,
            command.amount_cents,
            command.items,
            command.address,
        )?;
        let record = OutboxRecord::for_order(&order, OutboxEventType::PaymentRequest)?;

        self.store.create_order(&order, &record).await?;

        tracing::info!(
            saga_id = %order.tracking_id(),
            amount = %order.amount(),
            "order created, payment request queued"
        );
        metrics::counter!("orders_created_total").increment(1);

        Ok(CreatedOrder {
            tracking_id: order.tracking_id(),
            status: order.status(),
        })
    }
}
