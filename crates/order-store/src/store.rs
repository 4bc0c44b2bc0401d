use async_trait::async_trait;
use common::{RestaurantId, TrackingId, Version};
use domain::{Order, Restaurant};

use crate::outbox::{OutboxEventType, OutboxRecord};
use crate::Result;

/// Outcome of a conditional order update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The write applied; the order row now carries this version.
    Updated(Version),
    /// Another writer advanced the row first; nothing was written.
    Conflict,
}

impl UpdateOutcome {
    /// Returns the new version if the update applied.
    pub fn version(&self) -> Option<Version> {
        match self {
            UpdateOutcome::Updated(v) => Some(*v),
            UpdateOutcome::Conflict => None,
        }
    }
}

/// Outcome of a conditional outbox completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This caller won the race and completed the record.
    Completed,
    /// Another relay instance already claimed the record.
    StaleVersion,
}

/// Core persistence trait for orders and their transactional outbox.
///
/// The two write paths pair an order row with an outbox row inside one atomic
/// unit: a caller must never observe an order state change without its
/// corresponding event being durably recorded, and vice versa. All
/// implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order together with its first outbox record, atomically.
    async fn create_order(&self, order: &Order, record: &OutboxRecord) -> Result<()>;

    /// Conditionally updates an order row, appending an outbox record in the
    /// same transaction when one is supplied.
    ///
    /// The write only applies if the stored version equals
    /// `expected_version`; otherwise the whole unit rolls back and
    /// [`UpdateOutcome::Conflict`] is returned so the caller can re-read and
    /// retry or drop the triggering event.
    async fn update_order(
        &self,
        order: &Order,
        expected_version: Version,
        record: Option<&OutboxRecord>,
    ) -> Result<UpdateOutcome>;

    /// Loads an order by its tracking id.
    async fn find_by_tracking_id(&self, tracking_id: TrackingId) -> Result<Option<Order>>;

    /// Returns up to `limit` records of the given type that have not been
    /// handed to the transport yet, oldest first to bound staleness.
    async fn find_pending_outbox(
        &self,
        event_type: OutboxEventType,
        limit: u32,
    ) -> Result<Vec<OutboxRecord>>;

    /// Marks a record delivered and its saga step completed, conditional on
    /// the version read at fetch time. A stale version is a signal, not an
    /// error: at most one relay instance wins.
    async fn mark_delivered(&self, record: &OutboxRecord) -> Result<MarkOutcome>;

    /// Increments a record's delivery attempt counter; returns the new count.
    async fn record_attempt(&self, record: &OutboxRecord) -> Result<u32>;

    /// Terminally fails a record after the retry budget is exhausted.
    async fn mark_failed(&self, record: &OutboxRecord) -> Result<()>;

    /// Loads the local restaurant replica used for order validation.
    async fn find_restaurant(&self, restaurant_id: RestaurantId) -> Result<Option<Restaurant>>;

    /// Inserts or refreshes a restaurant replica entry.
    async fn upsert_restaurant(&self, restaurant: &Restaurant) -> Result<()>;
}
