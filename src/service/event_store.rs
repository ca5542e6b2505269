/// Bounded in-memory buffer of recently ingested events.
///
/// Payloads are opaque JSON values supplied by the ingestion collaborator;
/// the store never interprets them.
use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct EventStore {
    buffer: Arc<Mutex<VecDeque<Value>>>,
    capacity: usize,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    /// Append a batch, evicting the oldest events past capacity.
    pub async fn append(&self, events: &[Value]) {
        if self.capacity == 0 {
            return;
        }
        let mut buffer = self.buffer.lock().await;
        for event in events {
            if buffer.len() == self.capacity {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());
        }
    }

    /// The last `limit` events, most-recent-last.
    pub async fn recent(&self, limit: usize) -> Vec<Value> {
        let buffer = self.buffer.lock().await;
        let skip = buffer.len().saturating_sub(limit);
        buffer.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buffer.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn recent_returns_most_recent_last() {
        let store = EventStore::new(10);
        store.append(&[json!(1), json!(2), json!(3)]).await;
        assert_eq!(store.recent(2).await, vec![json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn recent_with_large_limit_returns_everything() {
        let store = EventStore::new(10);
        store.append(&[json!("a")]).await;
        assert_eq!(store.recent(100).await, vec![json!("a")]);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_first() {
        let store = EventStore::new(3);
        store.append(&[json!(1), json!(2), json!(3), json!(4)]).await;
        assert_eq!(store.len().await, 3);
        assert_eq!(store.recent(3).await, vec![json!(2), json!(3), json!(4)]);
    }

    #[tokio::test]
    async fn zero_capacity_stores_nothing() {
        let store = EventStore::new(0);
        store.append(&[json!(1)]).await;
        assert!(store.is_empty().await);
    }
}
