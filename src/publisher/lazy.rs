//! Process-wide publisher holder.
//!
//! The first [`SharedPublisher::get`] builds the publisher; concurrent callers
//! wait on the same initialization instead of building their own. A failed
//! build leaves the holder empty so the next call tries again.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{create_publisher, BatchPublisher, BatchQueuedMessage};
use crate::config::PublisherConfig;

/// Builds a fresh publisher on demand.
pub type PublisherFactory =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Arc<dyn BatchPublisher>>> + Send + Sync>;

type Slot = Arc<OnceCell<Arc<dyn BatchPublisher>>>;

pub struct SharedPublisher {
    slot: Mutex<Slot>,
    factory: PublisherFactory,
}

impl SharedPublisher {
    pub fn with_factory(factory: PublisherFactory) -> Self {
        Self {
            slot: Mutex::new(Arc::new(OnceCell::new())),
            factory,
        }
    }

    /// Holder for the publisher described by `config`.
    pub fn from_config(config: PublisherConfig) -> Self {
        let config = Arc::new(config);
        Self::with_factory(Arc::new(move || {
            let config = Arc::clone(&config);
            async move {
                let publisher: Arc<dyn BatchPublisher> = Arc::from(create_publisher(&config)?);
                tracing::info!("Initialized {} publisher", publisher.name());
                Ok::<_, anyhow::Error>(publisher)
            }
            .boxed()
        }))
    }

    /// The live publisher, building it on first use.
    pub async fn get(&self) -> anyhow::Result<Arc<dyn BatchPublisher>> {
        let slot = self.slot.lock().clone();
        let publisher = slot.get_or_try_init(|| (self.factory)()).await?;
        Ok(Arc::clone(publisher))
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.lock().initialized()
    }

    pub async fn publish(&self, message: &BatchQueuedMessage) -> anyhow::Result<()> {
        self.get().await?.publish(message).await
    }

    /// Close the current publisher, if any. A later [`get`](Self::get)
    /// builds a new one.
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), Arc::new(OnceCell::new()));

        if let Some(publisher) = previous.get() {
            match publisher.close().await {
                Ok(()) => tracing::info!("Closed {} publisher", publisher.name()),
                Err(e) => tracing::warn!("Failed to close {} publisher: {}", publisher.name(), e),
            }
        }
    }
}
