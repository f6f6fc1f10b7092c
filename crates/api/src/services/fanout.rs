//! Real-time fan-out hub.
//!
//! Holds every live push connection and distributes transition
//! notifications by `(site, category)` topic, plus user-scoped alert
//! firings. Delivery is best-effort, at-most-once: a subscriber whose
//! channel is full or closed is pruned from the registry rather than ever
//! blocking the publisher. Messages for one device arrive in emission
//! order; there is no ordering guarantee across devices.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::middleware::metrics::record_live_connections;
use domain::models::alert_subscription::AlertFiredNotification;
use domain::models::status_event::Transition;

/// Buffered messages per connection before the subscriber counts as slow.
const CHANNEL_CAPACITY: usize = 64;

/// Messages pushed over a live connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum PushMessage {
    Transition(Transition),
    AlertFired(AlertFiredNotification),
}

struct Subscriber {
    site_id: String,
    category: String,
    user_id: Option<Uuid>,
    tx: mpsc::Sender<String>,
}

/// Connection registry and publisher.
pub struct FanoutHub {
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

impl FanoutHub {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection subscribed to one `(site, category)` topic.
    /// A `user_id` additionally opts the connection into that user's alert
    /// firings.
    pub async fn subscribe(
        &self,
        site_id: impl Into<String>,
        category: impl Into<String>,
        user_id: Option<Uuid>,
    ) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let subscriber = Subscriber {
            site_id: site_id.into(),
            category: category.into(),
            user_id,
            tx,
        };

        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, subscriber);
            subscribers.len()
        };
        record_live_connections(count);

        tracing::info!(connection_id = %id, "Live connection registered");
        (id, rx)
    }

    /// Removes a connection. Safe to call for an already-pruned id.
    pub async fn unsubscribe(&self, id: &Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(id).is_some() {
            record_live_connections(subscribers.len());
            tracing::info!(connection_id = %id, "Live connection closed");
        }
    }

    /// Publishes a transition to every connection on its topic.
    pub async fn publish_transition(&self, transition: &Transition) {
        let message = PushMessage::Transition(transition.clone());
        self.send_matching(&message, |s| {
            s.site_id == transition.site_id && s.category == transition.category
        })
        .await;
    }

    /// Pushes an alert firing to the owning user's connections.
    pub async fn notify_user(&self, user_id: Uuid, notification: &AlertFiredNotification) {
        let message = PushMessage::AlertFired(notification.clone());
        self.send_matching(&message, |s| s.user_id == Some(user_id))
            .await;
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    async fn send_matching<F>(&self, message: &PushMessage, matches: F)
    where
        F: Fn(&Subscriber) -> bool,
    {
        let json = match serde_json::to_string(message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize push message");
                return;
            }
        };

        let mut dead: Vec<Uuid> = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, subscriber) in subscribers.iter() {
                if !matches(subscriber) {
                    continue;
                }
                // A full buffer means the subscriber cannot keep up; it is
                // pruned the same as a closed connection.
                if subscriber.tx.try_send(json.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &dead {
                if subscribers.remove(id).is_some() {
                    tracing::warn!(connection_id = %id, "Pruned unresponsive live connection");
                }
            }
            record_live_connections(subscribers.len());
        }
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::device::EquipmentStatus;

    fn transition(site_id: &str, category: &str) -> Transition {
        Transition {
            device_id: Uuid::new_v4(),
            site_id: site_id.to_string(),
            category: category.to_string(),
            from_status: EquipmentStatus::Occupied,
            to_status: EquipmentStatus::Free,
            timestamp: 1_000,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_matching_topic() {
        let hub = FanoutHub::new();
        let (_id, mut rx) = hub.subscribe("gym-01", "legs", None).await;

        hub.publish_transition(&transition("gym-01", "legs")).await;

        let message = rx.recv().await.expect("expected a message");
        assert!(message.contains("\"type\":\"transition\""));
        assert!(message.contains("\"toStatus\":\"free\""));
    }

    #[tokio::test]
    async fn test_publish_skips_other_topics() {
        let hub = FanoutHub::new();
        let (_id, mut rx) = hub.subscribe("gym-01", "chest", None).await;

        hub.publish_transition(&transition("gym-01", "legs")).await;
        hub.publish_transition(&transition("gym-02", "chest")).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_per_device_messages_arrive_in_order() {
        let hub = FanoutHub::new();
        let (_id, mut rx) = hub.subscribe("gym-01", "legs", None).await;

        let mut t = transition("gym-01", "legs");
        t.timestamp = 1;
        hub.publish_transition(&t).await;
        t.timestamp = 2;
        hub.publish_transition(&t).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.contains("\"timestamp\":1"));
        assert!(second.contains("\"timestamp\":2"));
    }

    #[tokio::test]
    async fn test_closed_connection_is_pruned() {
        let hub = FanoutHub::new();
        let (_id, rx) = hub.subscribe("gym-01", "legs", None).await;
        drop(rx);

        assert_eq!(hub.connection_count().await, 1);
        hub.publish_transition(&transition("gym-01", "legs")).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_slow_connection_is_pruned() {
        let hub = FanoutHub::new();
        let (_id, _rx) = hub.subscribe("gym-01", "legs", None).await;

        // Fill the buffer past capacity without draining
        for _ in 0..=CHANNEL_CAPACITY {
            hub.publish_transition(&transition("gym-01", "legs")).await;
        }
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_prune_leaves_healthy_connections() {
        let hub = FanoutHub::new();
        let (_dead, dead_rx) = hub.subscribe("gym-01", "legs", None).await;
        let (_live, mut live_rx) = hub.subscribe("gym-01", "legs", None).await;
        drop(dead_rx);

        hub.publish_transition(&transition("gym-01", "legs")).await;

        assert_eq!(hub.connection_count().await, 1);
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_notify_user_scoped_delivery() {
        let hub = FanoutHub::new();
        let user_id = Uuid::new_v4();
        let (_a, mut user_rx) = hub.subscribe("gym-01", "legs", Some(user_id)).await;
        let (_b, mut anon_rx) = hub.subscribe("gym-01", "legs", None).await;

        let notification = AlertFiredNotification {
            alert_id: Uuid::new_v4(),
            user_id,
            device_id: Uuid::new_v4(),
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            freed_at: 5_000,
        };
        hub.notify_user(user_id, &notification).await;

        let message = user_rx.recv().await.unwrap();
        assert!(message.contains("\"type\":\"alert_fired\""));
        assert!(message.contains("\"freedAt\":5000"));
        assert!(anon_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let hub = FanoutHub::new();
        let (id, _rx) = hub.subscribe("gym-01", "legs", None).await;

        hub.unsubscribe(&id).await;
        hub.unsubscribe(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }
}
