//! Durable persistence for orders and their transactional outbox.
//!
//! The core correctness property lives here: an order state change and the
//! outbox record it produces are written in one atomic unit, so a caller can
//! never observe one without the other. Outbox completion uses row-level
//! optimistic concurrency so that relay replicas racing on the same record
//! cannot both claim it.

pub mod error;
pub mod memory;
pub mod outbox;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use outbox::{OutboxEventType, OutboxPayload, OutboxRecord, RelayStatus, SagaStatus};
pub use postgres::PostgresOrderStore;
pub use store::{MarkOutcome, OrderStore, UpdateOutcome};
