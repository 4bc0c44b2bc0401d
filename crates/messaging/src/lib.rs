//! Publish/subscribe boundary for the order saga.
//!
//! The core never depends on a concrete broker: it publishes self-describing
//! messages to logical topics and subscribes handlers to response topics
//! through the [`MessageBus`] trait. The in-memory implementation backs tests
//! and local runs; a durable transport plugs in behind the same trait.

pub mod bus;
pub mod memory;
pub mod topics;

pub use bus::{BusError, BusMessage, MessageBus, Subscription};
pub use memory::InMemoryMessageBus;
