//! Outbox record types and payload schema.

use chrono::{DateTime, Utc};
use common::{RecordId, RestaurantId, TrackingId, Version};
use domain::{Order, OrderItem};
use serde::{Deserialize, Serialize};

/// The kind of cross-domain request an outbox record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxEventType {
    /// Ask the payment domain to charge the order amount.
    PaymentRequest,

    /// Ask the restaurant domain to approve the order.
    ApprovalRequest,

    /// Compensating variant: ask the payment domain to release captured funds.
    RefundRequest,
}

impl OutboxEventType {
    /// All event types, in the order the relay polls them.
    pub const ALL: [OutboxEventType; 3] = [
        OutboxEventType::PaymentRequest,
        OutboxEventType::ApprovalRequest,
        OutboxEventType::RefundRequest,
    ];

    /// Logical topic the relay publishes this event type to.
    pub fn topic(&self) -> &'static str {
        match self {
            OutboxEventType::PaymentRequest => "payment-request",
            OutboxEventType::ApprovalRequest => "approval-request",
            OutboxEventType::RefundRequest => "refund-request",
        }
    }

    /// Returns the stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxEventType::PaymentRequest => "PAYMENT_REQUEST",
            OutboxEventType::ApprovalRequest => "APPROVAL_REQUEST",
            OutboxEventType::RefundRequest => "REFUND_REQUEST",
        }
    }

    /// Parses a stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PAYMENT_REQUEST" => Some(OutboxEventType::PaymentRequest),
            "APPROVAL_REQUEST" => Some(OutboxEventType::ApprovalRequest),
            "REFUND_REQUEST" => Some(OutboxEventType::RefundRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutboxEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Saga-side lifecycle of an outbox record.
///
/// `Started → Completed` happens exactly once per record, enforced by the
/// version check in [`crate::OrderStore::mark_delivered`]. `Failed` is
/// terminal and only reached after the relay exhausts its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    #[default]
    Started,
    Completed,
    Failed,
}

impl SagaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "STARTED",
            SagaStatus::Completed => "COMPLETED",
            SagaStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STARTED" => Some(SagaStatus::Started),
            "COMPLETED" => Some(SagaStatus::Completed),
            "FAILED" => Some(SagaStatus::Failed),
            _ => None,
        }
    }
}

/// Transport-side lifecycle of an outbox record: has the relay handed it to
/// the message bus yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayStatus {
    #[default]
    Pending,
    Delivered,
}

impl RelayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayStatus::Pending => "PENDING",
            RelayStatus::Delivered => "DELIVERED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(RelayStatus::Pending),
            "DELIVERED" => Some(RelayStatus::Delivered),
            _ => None,
        }
    }
}

/// The payload the relay hands to the message bus, serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxPayload {
    pub saga_id: TrackingId,
    pub tracking_id: TrackingId,
    pub event_type: OutboxEventType,
    pub amount_cents: i64,
    pub restaurant_id: RestaurantId,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl OutboxPayload {
    /// Builds the payload for an order's outbox record.
    pub fn for_order(order: &Order, event_type: OutboxEventType) -> Self {
        Self {
            saga_id: order.tracking_id(),
            tracking_id: order.tracking_id(),
            event_type,
            amount_cents: order.amount().cents(),
            restaurant_id: order.restaurant_id(),
            items: order.items().to_vec(),
            created_at: Utc::now(),
        }
    }
}

/// A durable record of a domain event awaiting delivery to another domain.
///
/// Created in the same atomic unit as the order mutation that produced it;
/// mutated only by the outbox relay afterwards. Linked to its order by
/// `saga_id` alone, never an ownership edge, so the relay can operate without
/// loading order aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: RecordId,

    /// Saga correlation id, shared with the owning order's tracking id.
    pub saga_id: TrackingId,

    pub event_type: OutboxEventType,
    pub payload: serde_json::Value,
    pub saga_status: SagaStatus,
    pub relay_status: RelayStatus,

    /// Delivery attempts made so far.
    pub attempts: u32,

    pub created_at: DateTime<Utc>,
    pub version: Version,
}

impl OutboxRecord {
    /// Creates a `Started`/`Pending` record for an order.
    pub fn for_order(order: &Order, event_type: OutboxEventType) -> crate::Result<Self> {
        let payload = serde_json::to_value(OutboxPayload::for_order(order, event_type))?;
        Ok(Self {
            id: RecordId::new(),
            saga_id: order.tracking_id(),
            event_type,
            payload,
            saga_status: SagaStatus::Started,
            relay_status: RelayStatus::Pending,
            attempts: 0,
            created_at: Utc::now(),
            version: Version::initial(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CustomerId, ProductId};
    use domain::{DeliveryAddress, Money, Restaurant};

    fn sample_order() -> Order {
        let product_id = ProductId::new();
        let restaurant = Restaurant::new(RestaurantId::new(), "Trattoria", true).with_product(
            product_id,
            "Margherita",
            Money::from_cents(1099),
        );
        Order::initialize(
            CustomerId::new(),
            &restaurant,
            Money::from_cents(2198),
            vec![OrderItem::new(product_id, 2, Money::from_cents(1099))],
            DeliveryAddress::new("1 Main St", "10001", "Springfield"),
        )
        .unwrap()
    }

    #[test]
    fn topic_mapping() {
        assert_eq!(OutboxEventType::PaymentRequest.topic(), "payment-request");
        assert_eq!(OutboxEventType::ApprovalRequest.topic(), "approval-request");
        assert_eq!(OutboxEventType::RefundRequest.topic(), "refund-request");
    }

    #[test]
    fn event_type_roundtrip() {
        for ty in OutboxEventType::ALL {
            assert_eq!(OutboxEventType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(OutboxEventType::parse("SHIPMENT_REQUEST"), None);
    }

    #[test]
    fn new_record_starts_pending() {
        let order = sample_order();
        let record = OutboxRecord::for_order(&order, OutboxEventType::PaymentRequest).unwrap();

        assert_eq!(record.saga_id, order.tracking_id());
        assert_eq!(record.saga_status, SagaStatus::Started);
        assert_eq!(record.relay_status, RelayStatus::Pending);
        assert_eq!(record.attempts, 0);
        assert_eq!(record.version, Version::initial());
    }

    #[test]
    fn payload_carries_order_data() {
        let order = sample_order();
        let record = OutboxRecord::for_order(&order, OutboxEventType::ApprovalRequest).unwrap();
        let payload: OutboxPayload = serde_json::from_value(record.payload).unwrap();

        assert_eq!(payload.saga_id, order.tracking_id());
        assert_eq!(payload.amount_cents, 2198);
        assert_eq!(payload.restaurant_id, order.restaurant_id());
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.event_type, OutboxEventType::ApprovalRequest);
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let order = sample_order();
        let payload =
            serde_json::to_value(OutboxPayload::for_order(&order, OutboxEventType::PaymentRequest))
                .unwrap();
        assert!(payload.get("sagaId").is_some());
        assert!(payload.get("amountCents").is_some());
        assert!(payload.get("createdAt").is_some());
    }
}
