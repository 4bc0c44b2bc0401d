//! Integration tests for the order saga.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use common::{CustomerId, ProductId, RestaurantId, TrackingId, Version};
use domain::{DeliveryAddress, Money, Order, OrderError, OrderItem, OrderStatus, Restaurant};
use order_store::{
    InMemoryOrderStore, MarkOutcome, OrderStore, OutboxEventType, OutboxRecord, SagaStatus,
    UpdateOutcome,
};
use saga::{
    ApprovalOutcome, ApprovalResponse, ApprovalResponseHandler, CreateOrderCommand,
    CreateOrderHandler, FulfillmentHandler, PaymentOutcome, PaymentResponse,
    PaymentResponseHandler, RefundOutcome, RefundResponse, RefundResponseHandler, SagaError,
};

struct TestHarness {
    store: Arc<InMemoryOrderStore>,
    create: CreateOrderHandler<InMemoryOrderStore>,
    payment: PaymentResponseHandler<InMemoryOrderStore>,
    approval: ApprovalResponseHandler<InMemoryOrderStore>,
    refund: RefundResponseHandler<InMemoryOrderStore>,
    fulfillment: FulfillmentHandler<InMemoryOrderStore>,
    restaurant_id: RestaurantId,
    product_id: ProductId,
}

impl TestHarness {
    async fn new() -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let restaurant_id = RestaurantId::new();
        let product_id = ProductId::new();
        let restaurant = Restaurant::new(restaurant_id, "Trattoria Da Luca", true).with_product(
            product_id,
            "Margherita",
            Money::from_cents(1099),
        );
        store.upsert_restaurant(&restaurant).await.unwrap();

        Self {
            create: CreateOrderHandler::new(store.clone()),
            payment: PaymentResponseHandler::new(store.clone()),
            approval: ApprovalResponseHandler::new(store.clone()),
            refund: RefundResponseHandler::new(store.clone()),
            fulfillment: FulfillmentHandler::new(store.clone()),
            store,
            restaurant_id,
            product_id,
        }
    }

    fn command(&self, quantity: u32, amount_cents: i64) -> CreateOrderCommand {
        CreateOrderCommand {
            customer_id: CustomerId::new(),
            restaurant_id: self.restaurant_id,
            amount_cents: Money::from_cents(amount_cents),
            items: vec![OrderItem::new(
                self.product_id,
                quantity,
                Money::from_cents(1099),
            )],
            address: DeliveryAddress::new("12 Via Roma", "00100", "Rome"),
        }
    }

    /// Creates a five-pizza order worth $54.95 and returns its saga id.
    async fn create_order(&self) -> TrackingId {
        let created = self.create.handle(self.command(5, 5495)).await.unwrap();
        assert_eq!(created.status, OrderStatus::Pending);
        created.tracking_id
    }

    async fn status(&self, saga_id: TrackingId) -> OrderStatus {
        self.store
            .find_by_tracking_id(saga_id)
            .await
            .unwrap()
            .unwrap()
            .status()
    }

    async fn records_of(&self, saga_id: TrackingId, event_type: OutboxEventType) -> usize {
        self.store
            .records_for_saga(saga_id)
            .await
            .into_iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    fn payment_completed(saga_id: TrackingId) -> PaymentResponse {
        PaymentResponse {
            saga_id,
            outcome: PaymentOutcome::Completed,
            failure_messages: vec![],
        }
    }
}

/// Store wrapper that answers the next `conflicts` order updates with
/// [`UpdateOutcome::Conflict`], as if another writer kept winning the race.
struct ContendedStore {
    inner: InMemoryOrderStore,
    conflicts: AtomicU32,
}

impl ContendedStore {
    fn new(inner: InMemoryOrderStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl OrderStore for ContendedStore {
    async fn create_order(&self, order: &Order, record: &OutboxRecord) -> order_store::Result<()> {
        self.inner.create_order(order, record).await
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: Version,
        record: Option<&OutboxRecord>,
    ) -> order_store::Result<UpdateOutcome> {
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(UpdateOutcome::Conflict);
        }
        self.inner.update_order(order, expected_version, record).await
    }

    async fn find_by_tracking_id(
        &self,
        tracking_id: TrackingId,
    ) -> order_store::Result<Option<Order>> {
        self.inner.find_by_tracking_id(tracking_id).await
    }

    async fn find_pending_outbox(
        &self,
        event_type: OutboxEventType,
        limit: u32,
    ) -> order_store::Result<Vec<OutboxRecord>> {
        self.inner.find_pending_outbox(event_type, limit).await
    }

    async fn mark_delivered(&self, record: &OutboxRecord) -> order_store::Result<MarkOutcome> {
        self.inner.mark_delivered(record).await
    }

    async fn record_attempt(&self, record: &OutboxRecord) -> order_store::Result<u32> {
        self.inner.record_attempt(record).await
    }

    async fn mark_failed(&self, record: &OutboxRecord) -> order_store::Result<()> {
        self.inner.mark_failed(record).await
    }

    async fn find_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> order_store::Result<Option<Restaurant>> {
        self.inner.find_restaurant(restaurant_id).await
    }

    async fn upsert_restaurant(&self, restaurant: &Restaurant) -> order_store::Result<()> {
        self.inner.upsert_restaurant(restaurant).await
    }
}

#[tokio::test]
async fn create_order_writes_pending_order_and_payment_request() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    let order = harness
        .store
        .find_by_tracking_id(saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.amount(), Money::from_cents(5495));

    let records = harness.store.records_for_saga(saga_id).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, OutboxEventType::PaymentRequest);
    assert_eq!(records[0].saga_status, SagaStatus::Started);
    assert_eq!(records[0].payload["amountCents"], 5495);
}

#[tokio::test]
async fn empty_item_list_leaves_no_trace() {
    let harness = TestHarness::new().await;
    let command = CreateOrderCommand {
        items: vec![],
        ..harness.command(5, 5495)
    };

    let result = harness.create.handle(command).await;
    assert!(matches!(
        result,
        Err(SagaError::Order(OrderError::EmptyItemList))
    ));
    assert_eq!(harness.store.outbox_record_count().await, 0);
}

#[tokio::test]
async fn price_mismatch_is_rejected_before_any_write() {
    let harness = TestHarness::new().await;
    let result = harness.create.handle(harness.command(5, 5000)).await;
    assert!(matches!(
        result,
        Err(SagaError::Order(OrderError::PriceMismatch { .. }))
    ));
    assert_eq!(harness.store.outbox_record_count().await, 0);
}

#[tokio::test]
async fn unknown_restaurant_is_rejected() {
    let harness = TestHarness::new().await;
    let command = CreateOrderCommand {
        restaurant_id: RestaurantId::new(),
        ..harness.command(1, 1099)
    };
    let result = harness.create.handle(command).await;
    assert!(matches!(
        result,
        Err(SagaError::Order(OrderError::InvalidRestaurant { .. }))
    ));
}

#[tokio::test]
async fn completed_payment_moves_order_to_paid_and_queues_approval() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    let outcome = harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();
    assert!(outcome.was_applied());

    assert_eq!(harness.status(saga_id).await, OrderStatus::Paid);
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::ApprovalRequest)
            .await,
        1
    );
}

#[tokio::test]
async fn duplicate_payment_response_is_dropped() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();
    let second = harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();

    assert!(!second.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Paid);
    // Still exactly one approval request; the duplicate wrote nothing.
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::ApprovalRequest)
            .await,
        1
    );
}

#[tokio::test]
async fn failed_payment_cancels_in_one_step_with_audit_record() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    let outcome = harness
        .payment
        .handle(PaymentResponse {
            saga_id,
            outcome: PaymentOutcome::Failed,
            failure_messages: vec!["card declined".to_string()],
        })
        .await
        .unwrap();
    assert!(outcome.was_applied());

    // No money moved, so the order settles without a refund round trip.
    assert_eq!(harness.status(saga_id).await, OrderStatus::Cancelled);
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::RefundRequest)
            .await,
        1
    );

    let order = harness
        .store
        .find_by_tracking_id(saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.failure_messages(), ["card declined"]);
}

#[tokio::test]
async fn rejection_parks_order_until_refund_confirms() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;
    harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();

    let outcome = harness
        .approval
        .handle(ApprovalResponse {
            saga_id,
            outcome: ApprovalOutcome::Rejected,
            failure_messages: vec!["restaurant rejected the order".to_string()],
        })
        .await
        .unwrap();
    assert!(outcome.was_applied());

    // Paid money is on the line: wait for the refund participant.
    assert_eq!(harness.status(saga_id).await, OrderStatus::Cancelling);
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::RefundRequest)
            .await,
        1
    );

    let outcome = harness
        .refund
        .handle(RefundResponse {
            saga_id,
            outcome: RefundOutcome::Confirmed,
            failure_messages: vec![],
        })
        .await
        .unwrap();
    assert!(outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Cancelled);

    let order = harness
        .store
        .find_by_tracking_id(saga_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.failure_messages(), ["restaurant rejected the order"]);
}

#[tokio::test]
async fn approval_moves_paid_order_to_approved_and_fulfillment_completes_it() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;
    harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();

    let outcome = harness
        .approval
        .handle(ApprovalResponse {
            saga_id,
            outcome: ApprovalOutcome::Approved,
            failure_messages: vec![],
        })
        .await
        .unwrap();
    assert!(outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Approved);

    let outcome = harness.fulfillment.handle(saga_id).await.unwrap();
    assert!(outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Completed);
}

#[tokio::test]
async fn approval_response_before_payment_is_dropped() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    let outcome = harness
        .approval
        .handle(ApprovalResponse {
            saga_id,
            outcome: ApprovalOutcome::Approved,
            failure_messages: vec![],
        })
        .await
        .unwrap();

    assert!(!outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn refund_response_for_active_order_is_dropped() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    let outcome = harness
        .refund
        .handle(RefundResponse {
            saga_id,
            outcome: RefundOutcome::Confirmed,
            failure_messages: vec![],
        })
        .await
        .unwrap();

    assert!(!outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn failed_refund_leaves_order_parked() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;
    harness
        .payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();
    harness
        .approval
        .handle(ApprovalResponse {
            saga_id,
            outcome: ApprovalOutcome::Rejected,
            failure_messages: vec!["kitchen closed".to_string()],
        })
        .await
        .unwrap();

    let outcome = harness
        .refund
        .handle(RefundResponse {
            saga_id,
            outcome: RefundOutcome::Failed,
            failure_messages: vec!["gateway timeout".to_string()],
        })
        .await
        .unwrap();

    assert!(!outcome.was_applied());
    assert_eq!(harness.status(saga_id).await, OrderStatus::Cancelling);
}

#[tokio::test]
async fn transient_version_conflict_retries_once_and_applies() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    // The row moves from under the handler exactly once; the re-read retry
    // must land the transition.
    let contended = Arc::new(ContendedStore::new((*harness.store).clone(), 1));
    let payment = PaymentResponseHandler::new(contended);

    let outcome = payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();
    assert!(outcome.was_applied());

    assert_eq!(harness.status(saga_id).await, OrderStatus::Paid);
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::ApprovalRequest)
            .await,
        1
    );
}

#[tokio::test]
async fn repeated_version_conflict_drops_the_event() {
    let harness = TestHarness::new().await;
    let saga_id = harness.create_order().await;

    // Losing the race twice in a row exhausts the single retry.
    let contended = Arc::new(ContendedStore::new((*harness.store).clone(), 2));
    let payment = PaymentResponseHandler::new(contended);

    let outcome = payment
        .handle(TestHarness::payment_completed(saga_id))
        .await
        .unwrap();
    assert!(!outcome.was_applied());

    assert_eq!(harness.status(saga_id).await, OrderStatus::Pending);
    assert_eq!(
        harness
            .records_of(saga_id, OutboxEventType::ApprovalRequest)
            .await,
        0
    );
}

#[tokio::test]
async fn response_for_unknown_saga_is_an_error() {
    let harness = TestHarness::new().await;
    let result = harness
        .payment
        .handle(TestHarness::payment_completed(TrackingId::new()))
        .await;
    assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
}
