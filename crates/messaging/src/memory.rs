use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::bus::{BusError, BusMessage, MessageBus, Subscription};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct BusState {
    channels: HashMap<String, broadcast::Sender<BusMessage>>,
    published: Vec<(String, BusMessage)>,
    fail_on_publish: bool,
}

impl BusState {
    fn channel(&mut self, topic: &str) -> broadcast::Sender<BusMessage> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// In-memory message bus for testing and local runs.
///
/// Keeps a log of everything published so tests can assert on delivery
/// attempts, and can be told to fail publishes to exercise retry paths.
#[derive(Clone, Default)]
pub struct InMemoryMessageBus {
    state: Arc<Mutex<BusState>>,
}

impl InMemoryMessageBus {
    /// Creates a new bus with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the bus to reject every publish until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_publish = fail;
    }

    /// Returns the number of successfully published messages on a topic.
    pub fn published_count(&self, topic: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }

    /// Returns the messages successfully published on a topic, in order.
    pub fn published(&self, topic: &str) -> Vec<BusMessage> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, topic: &str, message: BusMessage) -> Result<(), BusError> {
        let sender = {
            let mut state = self.state.lock().unwrap();

            if state.fail_on_publish {
                return Err(BusError::Transport {
                    topic: topic.to_string(),
                    reason: "publish rejected by test configuration".to_string(),
                });
            }

            state.published.push((topic.to_string(), message.clone()));
            state.channel(topic)
        };

        // No subscribers yet is fine; the log above still records the publish.
        let _ = sender.send(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.channel(topic).subscribe())
    }
}
