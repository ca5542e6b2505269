/// Event broadcast registry: the set of live stream-viewer channels.
///
/// Each subscriber owns the receiving half of an unbounded channel whose
/// sending half lives in the registry; the socket task drains the receiver
/// and writes frames. Replay-on-subscribe and fan-out both run under the
/// registry lock, which is what guarantees a viewer sees the `initial`
/// batch before any live event.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::api::dto::StreamServerMessage;

pub type SubscriberId = u64;

#[derive(Clone)]
pub struct BroadcastRegistry {
    subscribers: Arc<Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<StreamServerMessage>>>>,
    next_id: Arc<AtomicU64>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a viewer, queueing the replay batch (most-recent-last)
    /// ahead of any live event.
    pub async fn subscribe(
        &self,
        replay: Vec<Value>,
    ) -> (SubscriberId, mpsc::UnboundedReceiver<StreamServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.subscribers.lock().await;
        let _ = tx.send(StreamServerMessage::Initial { data: replay });
        subscribers.insert(id, tx);
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.lock().await.remove(&id);
    }

    /// Fan a batch out to every subscriber, each event wrapped with its
    /// type discriminator. A failed send marks that subscriber as gone and
    /// removes it without aborting delivery to the rest.
    pub async fn broadcast(&self, events: &[Value]) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = self.subscribers.lock().await;
        for event in events {
            subscribers.retain(|id, tx| {
                let delivered = tx
                    .send(StreamServerMessage::Event {
                        data: event.clone(),
                    })
                    .is_ok();
                if !delivered {
                    debug!("Dropping dead stream subscriber {}", id);
                }
                delivered
            });
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for BroadcastRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn initial_batch_precedes_live_events() {
        let registry = BroadcastRegistry::new();
        let (_, mut rx) = registry.subscribe(vec![json!({"seq": 1})]).await;
        registry.broadcast(&[json!({"seq": 2})]).await;

        assert_eq!(
            rx.recv().await,
            Some(StreamServerMessage::Initial {
                data: vec![json!({"seq": 1})]
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(StreamServerMessage::Event {
                data: json!({"seq": 2})
            })
        );
    }

    #[tokio::test]
    async fn batch_order_is_preserved_per_subscriber() {
        let registry = BroadcastRegistry::new();
        let (_, mut rx) = registry.subscribe(vec![]).await;
        registry.broadcast(&[json!(1), json!(2), json!(3)]).await;

        let _ = rx.recv().await; // initial
        for expected in 1..=3 {
            assert_eq!(
                rx.recv().await,
                Some(StreamServerMessage::Event {
                    data: json!(expected)
                })
            );
        }
    }

    #[tokio::test]
    async fn dead_subscriber_is_dropped_without_aborting_delivery() {
        let registry = BroadcastRegistry::new();
        let (_, rx_dead) = registry.subscribe(vec![]).await;
        let (_, mut rx_live) = registry.subscribe(vec![]).await;
        assert_eq!(registry.subscriber_count().await, 2);

        drop(rx_dead);
        registry.broadcast(&[json!("after")]).await;

        let _ = rx_live.recv().await; // initial
        assert_eq!(
            rx_live.recv().await,
            Some(StreamServerMessage::Event {
                data: json!("after")
            })
        );
        assert_eq!(registry.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn unsubscribed_viewer_receives_nothing_further() {
        let registry = BroadcastRegistry::new();
        let (id, mut rx) = registry.subscribe(vec![]).await;
        let _ = rx.recv().await; // initial

        registry.unsubscribe(id).await;
        registry.broadcast(&[json!("late")]).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.subscriber_count().await, 0);
    }
}
