use common::{RecordId, TrackingId};
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists for the given tracking id.
    #[error("Order not found for tracking id {0}")]
    OrderNotFound(TrackingId),

    /// No outbox record exists with the given id.
    #[error("Outbox record not found: {0}")]
    RecordNotFound(RecordId),

    /// An outbox record of this type already exists for the saga step.
    #[error("Outbox record already exists for saga {saga_id} with type {event_type}")]
    DuplicateRecord {
        saga_id: TrackingId,
        event_type: String,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row contains a value the code cannot interpret.
    #[error("Invalid stored value: {0}")]
    InvalidRow(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
