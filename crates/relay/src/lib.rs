//! Publishing relay for the transactional outbox.
//!
//! The relay polls each outbox record set for records that are still pending,
//! publishes their payloads to the matching topic, and only then marks them
//! delivered. Publishing before marking makes delivery at least once: a crash
//! between the two steps redelivers the record on the next poll. Completion
//! goes through a version-conditional write, so when several relay replicas
//! race on one record exactly one marks it delivered.

use std::sync::Arc;
use std::time::Duration;

use messaging::{BusMessage, MessageBus};
use order_store::{MarkOutcome, OrderStore, OutboxEventType, OutboxRecord, StoreError};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Tuning knobs for the relay loop.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How long to sleep between polling passes.
    pub poll_interval: Duration,
    /// Maximum records fetched per record set per pass.
    pub batch_size: u32,
    /// Delivery attempts before a record is terminally failed.
    pub max_attempts: u32,
    /// Upper bound on a single publish call.
    pub delivery_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 32,
            max_attempts: 5,
            delivery_timeout: Duration::from_secs(3),
        }
    }
}

/// Drains pending outbox records onto the message bus.
pub struct OutboxRelay<S, B> {
    store: Arc<S>,
    bus: Arc<B>,
    config: RelayConfig,
}

impl<S, B> OutboxRelay<S, B>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    pub fn new(store: Arc<S>, bus: Arc<B>, config: RelayConfig) -> Self {
        Self { store, bus, config }
    }

    /// Runs the polling loop until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(error) = self.tick().await {
                    tracing::error!(%error, "outbox polling pass failed");
                }
            }
        })
    }

    /// Runs one polling pass over every record set; returns how many records
    /// were delivered.
    pub async fn tick(&self) -> Result<usize, StoreError> {
        let mut delivered = 0;
        for event_type in OutboxEventType::ALL {
            let pending = self
                .store
                .find_pending_outbox(event_type, self.config.batch_size)
                .await?;
            for record in pending {
                if self.deliver(&record).await? {
                    delivered += 1;
                }
            }
        }
        Ok(delivered)
    }

    /// Publishes one record and marks it delivered if the publish succeeded.
    async fn deliver(&self, record: &OutboxRecord) -> Result<bool, StoreError> {
        let topic = record.event_type.topic();
        let message = BusMessage::json(record.payload.clone());

        let published = match timeout(
            self.config.delivery_timeout,
            self.bus.publish(topic, message),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                tracing::warn!(record_id = %record.id, topic, %error, "publish failed");
                false
            }
            Err(_) => {
                tracing::warn!(record_id = %record.id, topic, "publish timed out");
                false
            }
        };

        if !published {
            metrics::counter!("outbox_delivery_failures_total", "topic" => topic).increment(1);
            let attempts = self.store.record_attempt(record).await?;
            if attempts >= self.config.max_attempts {
                self.store.mark_failed(record).await?;
                tracing::error!(
                    record_id = %record.id,
                    saga_id = %record.saga_id,
                    topic,
                    attempts,
                    "delivery attempts exhausted, record failed terminally"
                );
                metrics::counter!("outbox_records_failed_total", "topic" => topic).increment(1);
            }
            return Ok(false);
        }

        match self.store.mark_delivered(record).await? {
            MarkOutcome::Completed => {
                tracing::debug!(record_id = %record.id, topic, "outbox record delivered");
                metrics::counter!("outbox_delivered_total", "topic" => topic).increment(1);
                Ok(true)
            }
            MarkOutcome::StaleVersion => {
                // Another replica won the record; ours was a redelivery.
                tracing::debug!(record_id = %record.id, topic, "record already claimed");
                Ok(false)
            }
        }
    }
}
