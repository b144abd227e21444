//! "Batch queued" notifications for the downstream worker.
//!
//! Publishers are reached through [`SharedPublisher`], which builds the
//! configured [`BatchPublisher`] on first use and tears it down on shutdown.

mod lazy;
mod webhook;

pub use lazy::{PublisherFactory, SharedPublisher};
pub use webhook::WebhookPublisher;

use async_trait::async_trait;
use mediasort_common::BatchId;
use serde::{Deserialize, Serialize};

use crate::config::{PublisherConfig, PublisherKind};

/// Payload announcing a stored batch.
///
/// Serializes as `{"_id", "directory"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQueuedMessage {
    #[serde(rename = "_id")]
    pub id: BatchId,
    pub directory: String,
}

impl BatchQueuedMessage {
    pub fn new(id: BatchId, directory: impl Into<String>) -> Self {
        Self {
            id,
            directory: directory.into(),
        }
    }
}

/// A destination for batch notifications.
#[async_trait]
pub trait BatchPublisher: Send + Sync {
    /// Short identifier for logs (e.g. `"webhook"`).
    fn name(&self) -> &'static str;

    /// Deliver one notification. No retries.
    async fn publish(&self, message: &BatchQueuedMessage) -> anyhow::Result<()>;

    /// Release any held connections.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records notifications through `tracing` only.
#[derive(Debug, Default)]
pub struct LogPublisher {
    topic: String,
}

impl LogPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl BatchPublisher for LogPublisher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, message: &BatchQueuedMessage) -> anyhow::Result<()> {
        tracing::info!(
            topic = %self.topic,
            batch_id = %message.id,
            directory = %message.directory,
            "Batch queued"
        );
        Ok(())
    }
}

/// Build the publisher described by `config`.
pub fn create_publisher(config: &PublisherConfig) -> anyhow::Result<Box<dyn BatchPublisher>> {
    match config.kind {
        PublisherKind::Log => Ok(Box::new(LogPublisher::new(config.topic.clone()))),
        PublisherKind::Webhook => {
            let url = config
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Webhook publisher requires publisher.url"))?;
            Ok(Box::new(WebhookPublisher::new(
                url,
                config.topic.clone(),
                std::time::Duration::from_secs(config.timeout_secs),
            )))
        }
    }
}
