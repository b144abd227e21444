use mediasort_common::BatchId;
use mediasort_db::models::BatchStatus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Application-wide event for SSE broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A batch was stored and its notification published.
    BatchQueued {
        id: BatchId,
        directory: String,
        item_count: usize,
    },
    /// A stored batch was edited.
    BatchUpdated { id: BatchId, status: BatchStatus },
    BatchDeleted { id: BatchId },
    /// The notification for a stored batch was sent again.
    BatchRepublished { id: BatchId, directory: String },
}

/// Counters since process start, reported by the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued: u64,
    pub updated: u64,
    pub deleted: u64,
    pub republished: u64,
}

pub struct AppState {
    stats: RwLock<QueueStats>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            stats: RwLock::new(QueueStats::default()),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Record and broadcast an event to all subscribers.
    pub fn broadcast(&self, event: AppEvent) {
        {
            let mut stats = self.stats.write();
            match &event {
                AppEvent::BatchQueued { .. } => stats.queued += 1,
                AppEvent::BatchUpdated { .. } => stats.updated += 1,
                AppEvent::BatchDeleted { .. } => stats.deleted += 1,
                AppEvent::BatchRepublished { .. } => stats.republished += 1,
            }
        }

        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for event");
        }
    }

    pub fn get_stats(&self) -> QueueStats {
        self.stats.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let id = BatchId::new();
        let event = AppEvent::BatchQueued {
            id,
            directory: "Show".into(),
            item_count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "batch_queued");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["item_count"], 3);

        let json = serde_json::to_value(AppEvent::BatchUpdated {
            id,
            status: BatchStatus::Completed,
        })
        .unwrap();
        assert_eq!(json["event_type"], "batch_updated");
        assert_eq!(json["status"], "completed");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let state = AppState::new();
        let mut rx = state.subscribe();
        let id = BatchId::new();

        state.broadcast(AppEvent::BatchDeleted { id });

        assert_eq!(rx.recv().await.unwrap(), AppEvent::BatchDeleted { id });
    }

    #[test]
    fn test_stats_count_without_subscribers() {
        let state = AppState::new();
        let id = BatchId::new();
        state.broadcast(AppEvent::BatchDeleted { id });
        state.broadcast(AppEvent::BatchRepublished {
            id,
            directory: "Show".into(),
        });
        state.broadcast(AppEvent::BatchRepublished {
            id,
            directory: "Show".into(),
        });

        let stats = state.get_stats();
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.republished, 2);
        assert_eq!(stats.queued, 0);
    }
}
