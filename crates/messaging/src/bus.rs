use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur at the transport boundary.
#[derive(Debug, Error)]
pub enum BusError {
    /// The transport rejected or lost the message.
    #[error("Transport error on topic '{topic}': {reason}")]
    Transport { topic: String, reason: String },

    /// The payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A self-describing message: the content type travels alongside the payload
/// so consumers can negotiate schema evolution with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub content_type: String,
    pub body: serde_json::Value,
}

impl BusMessage {
    /// Wraps a JSON value as an `application/json` message.
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            content_type: "application/json".to_string(),
            body,
        }
    }

    /// Serializes a value into an `application/json` message.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, BusError> {
        Ok(Self::json(serde_json::to_value(value)?))
    }
}

/// A stream of messages for one topic subscription.
///
/// Backed by a broadcast channel: every subscriber of a topic sees every
/// message published after it subscribed.
pub type Subscription = broadcast::Receiver<BusMessage>;

/// Abstract publish/subscribe capability.
///
/// The saga core depends only on this trait, not on which transport
/// implements it. Delivery guarantees are the implementation's concern; the
/// consumers behind `subscribe` must tolerate duplicates either way.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a message to a logical topic. Returning `Ok` means the
    /// transport acknowledged the hand-off.
    async fn publish(&self, topic: &str, message: BusMessage) -> Result<(), BusError>;

    /// Subscribes to a logical topic, receiving messages published from this
    /// point on.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError>;
}
