use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{RecordId, RestaurantId, TrackingId, Version};
use domain::{Order, Restaurant};
use tokio::sync::RwLock;

use crate::outbox::{OutboxEventType, OutboxRecord, RelayStatus, SagaStatus};
use crate::store::{MarkOutcome, OrderStore, UpdateOutcome};
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    orders: HashMap<TrackingId, Order>,
    // Mirrors the two durable record sets, payment_outbox and approval_outbox.
    payment_outbox: Vec<OutboxRecord>,
    approval_outbox: Vec<OutboxRecord>,
    restaurants: HashMap<RestaurantId, Restaurant>,
}

impl State {
    fn records(&self, event_type: OutboxEventType) -> &Vec<OutboxRecord> {
        match event_type {
            OutboxEventType::PaymentRequest | OutboxEventType::RefundRequest => {
                &self.payment_outbox
            }
            OutboxEventType::ApprovalRequest => &self.approval_outbox,
        }
    }

    fn records_mut(&mut self, event_type: OutboxEventType) -> &mut Vec<OutboxRecord> {
        match event_type {
            OutboxEventType::PaymentRequest | OutboxEventType::RefundRequest => {
                &mut self.payment_outbox
            }
            OutboxEventType::ApprovalRequest => &mut self.approval_outbox,
        }
    }

    fn append_record(&mut self, record: &OutboxRecord) -> Result<()> {
        let records = self.records_mut(record.event_type);
        if records
            .iter()
            .any(|r| r.saga_id == record.saga_id && r.event_type == record.event_type)
        {
            return Err(StoreError::DuplicateRecord {
                saga_id: record.saga_id,
                event_type: record.event_type.as_str().to_string(),
            });
        }
        records.push(record.clone());
        Ok(())
    }
}

/// In-memory order store for testing and local runs.
///
/// A single lock over the whole state stands in for the database transaction:
/// writes that must be atomic hold the write guard for their full duration.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of outbox records across both record sets.
    pub async fn outbox_record_count(&self) -> usize {
        let state = self.state.read().await;
        state.payment_outbox.len() + state.approval_outbox.len()
    }

    /// Looks up a single outbox record by id.
    pub async fn find_record(&self, record_id: RecordId) -> Option<OutboxRecord> {
        let state = self.state.read().await;
        state
            .payment_outbox
            .iter()
            .chain(state.approval_outbox.iter())
            .find(|r| r.id == record_id)
            .cloned()
    }

    /// Returns every record for a saga, oldest first.
    pub async fn records_for_saga(&self, saga_id: TrackingId) -> Vec<OutboxRecord> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .payment_outbox
            .iter()
            .chain(state.approval_outbox.iter())
            .filter(|r| r.saga_id == saga_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: &Order, record: &OutboxRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.append_record(record)?;
        state.orders.insert(order.tracking_id(), order.clone());
        Ok(())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: Version,
        record: Option<&OutboxRecord>,
    ) -> Result<UpdateOutcome> {
        let mut state = self.state.write().await;

        let stored_version = state
            .orders
            .get(&order.tracking_id())
            .ok_or(StoreError::OrderNotFound(order.tracking_id()))?
            .version();

        if stored_version != expected_version {
            return Ok(UpdateOutcome::Conflict);
        }

        if let Some(record) = record {
            state.append_record(record)?;
        }

        let new_version = expected_version.next();
        let mut updated = order.clone();
        updated.set_version(new_version);
        state.orders.insert(order.tracking_id(), updated);

        Ok(UpdateOutcome::Updated(new_version))
    }

    async fn find_by_tracking_id(&self, tracking_id: TrackingId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&tracking_id).cloned())
    }

    async fn find_pending_outbox(
        &self,
        event_type: OutboxEventType,
        limit: u32,
    ) -> Result<Vec<OutboxRecord>> {
        let state = self.state.read().await;
        let mut pending: Vec<_> = state
            .records(event_type)
            .iter()
            .filter(|r| {
                r.event_type == event_type
                    && r.relay_status == RelayStatus::Pending
                    && r.saga_status == SagaStatus::Started
            })
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_delivered(&self, record: &OutboxRecord) -> Result<MarkOutcome> {
        let mut state = self.state.write().await;
        let stored = state
            .records_mut(record.event_type)
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::RecordNotFound(record.id))?;

        if stored.version != record.version {
            return Ok(MarkOutcome::StaleVersion);
        }

        stored.saga_status = SagaStatus::Completed;
        stored.relay_status = RelayStatus::Delivered;
        stored.version = stored.version.next();
        Ok(MarkOutcome::Completed)
    }

    async fn record_attempt(&self, record: &OutboxRecord) -> Result<u32> {
        let mut state = self.state.write().await;
        let stored = state
            .records_mut(record.event_type)
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::RecordNotFound(record.id))?;
        stored.attempts += 1;
        Ok(stored.attempts)
    }

    async fn mark_failed(&self, record: &OutboxRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .records_mut(record.event_type)
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::RecordNotFound(record.id))?;
        stored.saga_status = SagaStatus::Failed;
        Ok(())
    }

    async fn find_restaurant(&self, restaurant_id: RestaurantId) -> Result<Option<Restaurant>> {
        let state = self.state.read().await;
        Ok(state.restaurants.get(&restaurant_id).cloned())
    }

    async fn upsert_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        let mut state = self.state.write().await;
        state.restaurants.insert(restaurant.id, restaurant.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::{CustomerId, ProductId};
    use domain::{DeliveryAddress, Money, OrderItem};

    fn seeded_restaurant(product_id: ProductId) -> Restaurant {
        Restaurant::new(RestaurantId::new(), "Trattoria", true).with_product(
            product_id,
            "Margherita",
            Money::from_cents(1099),
        )
    }

    fn sample_order(restaurant: &Restaurant, product_id: ProductId) -> Order {
        Order::initialize(
            CustomerId::new(),
            restaurant,
            Money::from_cents(1099),
            vec![OrderItem::new(product_id, 1, Money::from_cents(1099))],
            DeliveryAddress::new("1 Main St", "10001", "Springfield"),
        )
        .unwrap()
    }

    async fn stored_order(store: &InMemoryOrderStore) -> Order {
        let product_id = ProductId::new();
        let restaurant = seeded_restaurant(product_id);
        let order = sample_order(&restaurant, product_id);
        let record = OutboxRecord::for_order(&order, OutboxEventType::PaymentRequest).unwrap();
        store.create_order(&order, &record).await.unwrap();
        order
    }

    #[tokio::test]
    async fn create_and_find_by_tracking_id() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;

        let found = store
            .find_by_tracking_id(order.tracking_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), order.id());
        assert_eq!(store.outbox_record_count().await, 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_saga_step_record() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;

        let dup = OutboxRecord::for_order(&order, OutboxEventType::PaymentRequest).unwrap();
        let result = store
            .update_order(&order, order.version(), Some(&dup))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateRecord { .. })));
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = InMemoryOrderStore::new();
        let mut order = stored_order(&store).await;

        order.pay().unwrap();
        let outcome = store
            .update_order(&order, order.version(), None)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated(Version::new(1)));

        // Same fetch-time version again: the row has moved on.
        let outcome = store
            .update_order(&order, Version::initial(), None)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Conflict);
    }

    #[tokio::test]
    async fn conflict_does_not_append_outbox_record() {
        let store = InMemoryOrderStore::new();
        let mut order = stored_order(&store).await;
        order.pay().unwrap();
        store
            .update_order(&order, Version::initial(), None)
            .await
            .unwrap();

        let record = OutboxRecord::for_order(&order, OutboxEventType::ApprovalRequest).unwrap();
        let outcome = store
            .update_order(&order, Version::initial(), Some(&record))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Conflict);
        assert_eq!(store.outbox_record_count().await, 1);
    }

    #[tokio::test]
    async fn find_pending_is_oldest_first_and_bounded() {
        let store = InMemoryOrderStore::new();
        let mut orders = Vec::new();
        for _ in 0..3 {
            orders.push(stored_order(&store).await);
        }

        // Force distinct creation times, newest stored first.
        {
            let mut state = store.state.write().await;
            let base = Utc::now();
            for (i, record) in state.payment_outbox.iter_mut().enumerate() {
                record.created_at = base - Duration::seconds(i as i64);
            }
        }

        let pending = store
            .find_pending_outbox(OutboxEventType::PaymentRequest, 2)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].created_at <= pending[1].created_at);
    }

    #[tokio::test]
    async fn mark_delivered_is_exactly_once() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;
        let record = store.records_for_saga(order.tracking_id()).await[0].clone();

        assert_eq!(
            store.mark_delivered(&record).await.unwrap(),
            MarkOutcome::Completed
        );
        // Second attempt with the same fetch-time version loses the race.
        assert_eq!(
            store.mark_delivered(&record).await.unwrap(),
            MarkOutcome::StaleVersion
        );

        let stored = store.find_record(record.id).await.unwrap();
        assert_eq!(stored.saga_status, SagaStatus::Completed);
        assert_eq!(stored.relay_status, RelayStatus::Delivered);
    }

    #[tokio::test]
    async fn delivered_records_are_not_pending() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;
        let record = store.records_for_saga(order.tracking_id()).await[0].clone();
        store.mark_delivered(&record).await.unwrap();

        let pending = store
            .find_pending_outbox(OutboxEventType::PaymentRequest, 10)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn attempts_and_failure() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;
        let record = store.records_for_saga(order.tracking_id()).await[0].clone();

        assert_eq!(store.record_attempt(&record).await.unwrap(), 1);
        assert_eq!(store.record_attempt(&record).await.unwrap(), 2);

        store.mark_failed(&record).await.unwrap();
        let stored = store.find_record(record.id).await.unwrap();
        assert_eq!(stored.saga_status, SagaStatus::Failed);

        // Failed records are no longer offered to the relay.
        let pending = store
            .find_pending_outbox(OutboxEventType::PaymentRequest, 10)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn restaurant_replica_roundtrip() {
        let store = InMemoryOrderStore::new();
        let product_id = ProductId::new();
        let restaurant = seeded_restaurant(product_id);

        store.upsert_restaurant(&restaurant).await.unwrap();
        let found = store
            .find_restaurant(restaurant.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, restaurant);

        assert!(store
            .find_restaurant(RestaurantId::new())
            .await
            .unwrap()
            .is_none());
    }
}
