//! Batch submission and lifecycle.
//!
//! A submitted batch is validated, stored, then announced through the
//! publisher. Storage runs on the blocking pool.

use mediasort_common::{BatchId, Error, Result};
use mediasort_db::models::{BatchStatus, BatchUpdate, SeriesBatch};
use mediasort_db::pool::{get_conn, DbPool};
use mediasort_db::queries::batches;
use mediasort_naming::{build, find_duplicate_destinations, NamingError, QueuedItem, VideoEntry};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::publisher::{BatchQueuedMessage, SharedPublisher};
use crate::state::{AppEvent, AppState};

const ROOT_SERIES_NAME: &str = "Root Directory";

#[derive(Clone)]
pub struct BatchQueue {
    pool: DbPool,
    publisher: Arc<SharedPublisher>,
    state: Arc<AppState>,
}

impl BatchQueue {
    pub fn new(pool: DbPool, publisher: Arc<SharedPublisher>, state: Arc<AppState>) -> Self {
        Self {
            pool,
            publisher,
            state,
        }
    }

    /// Store `items` for `directory` and publish the "batch queued"
    /// notification.
    ///
    /// Nothing is stored when an item is invalid or two items share a
    /// destination. If publishing fails the batch stays stored and the
    /// returned error names its id so it can be republished.
    pub async fn submit(&self, directory: &str, items: Vec<QueuedItem>) -> Result<SeriesBatch> {
        let directory = directory.trim().to_string();
        if directory.is_empty() {
            return Err(Error::validation("directory is required"));
        }
        validate_items(&items)?;

        let batch = self
            .with_conn(move |conn| batches::create_batch(conn, &directory, items))
            .await?;

        tracing::info!(
            batch_id = %batch.id,
            directory = %batch.directory,
            items = batch.items.len(),
            "Stored batch"
        );

        self.publish(&batch).await?;
        self.state.broadcast(AppEvent::BatchQueued {
            id: batch.id,
            directory: batch.directory.clone(),
            item_count: batch.items.len(),
        });

        Ok(batch)
    }

    /// Build assignments for `entries` and submit them.
    ///
    /// `series` defaults to the last component of `directory`.
    pub async fn submit_entries(
        &self,
        directory: &str,
        series: Option<&str>,
        entries: &[VideoEntry],
    ) -> Result<SeriesBatch> {
        let series = match series.map(str::trim).filter(|s| !s.is_empty()) {
            Some(series) => series.to_string(),
            None => default_series_name(directory),
        };
        let items = build(&series, entries).map_err(naming_error)?;
        self.submit(directory, items).await
    }

    pub async fn get(&self, id: BatchId) -> Result<SeriesBatch> {
        self.with_conn(move |conn| batches::get_batch(conn, id)).await
    }

    pub async fn list(&self, status: Option<BatchStatus>, limit: Option<usize>) -> Result<Vec<SeriesBatch>> {
        let limit = limit.unwrap_or(batches::DEFAULT_LIST_LIMIT);
        self.with_conn(move |conn| batches::list_batches(conn, status, limit))
            .await
    }

    pub async fn update(&self, id: BatchId, update: BatchUpdate) -> Result<SeriesBatch> {
        if update.is_empty() {
            return Err(Error::validation("update must set directory, items, or status"));
        }
        if let Some(directory) = &update.directory {
            if directory.trim().is_empty() {
                return Err(Error::validation("directory must not be empty"));
            }
        }
        if let Some(items) = &update.items {
            validate_items(items)?;
        }

        let batch = self
            .with_conn(move |conn| batches::update_batch(conn, id, &update))
            .await?;

        self.state.broadcast(AppEvent::BatchUpdated {
            id,
            status: batch.status,
        });
        Ok(batch)
    }

    pub async fn delete(&self, id: BatchId) -> Result<()> {
        self.with_conn(move |conn| batches::delete_batch(conn, id))
            .await?;
        self.state.broadcast(AppEvent::BatchDeleted { id });
        Ok(())
    }

    /// Announce a stored batch again using its stored directory.
    pub async fn republish(&self, id: BatchId) -> Result<SeriesBatch> {
        let batch = self.get(id).await?;
        self.publish(&batch).await?;

        tracing::info!(batch_id = %batch.id, "Republished batch");
        self.state.broadcast(AppEvent::BatchRepublished {
            id: batch.id,
            directory: batch.directory.clone(),
        });
        Ok(batch)
    }

    /// Stored batch counts per status.
    pub async fn counts(&self) -> Result<Vec<(BatchStatus, i64)>> {
        self.with_conn(batches::count_by_status).await
    }

    async fn publish(&self, batch: &SeriesBatch) -> Result<()> {
        let message = BatchQueuedMessage::new(batch.id, batch.directory.clone());
        self.publisher.publish(&message).await.map_err(|e| {
            tracing::error!(batch_id = %batch.id, "Failed to publish batch: {:#}", e);
            Error::tool(
                "publisher",
                format!("batch {} is stored but was not published: {}", batch.id, e),
            )
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::internal(format!("Database task failed: {}", e)))?
    }
}

/// Series name derived from a pending directory path.
pub fn default_series_name(directory: &str) -> String {
    let trimmed = directory.trim().trim_end_matches(['/', '\\']);
    if trimmed.is_empty() || trimmed == "." {
        return ROOT_SERIES_NAME.to_string();
    }
    Path::new(trimmed)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ROOT_SERIES_NAME.to_string())
}

fn validate_items(items: &[QueuedItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("batch must contain at least one item"));
    }

    for item in items {
        if item.path.trim().is_empty() {
            return Err(Error::validation("item path is required"));
        }
        item.assignment.validate().map_err(naming_error)?;
    }

    let duplicates = find_duplicate_destinations(items);
    if !duplicates.is_empty() {
        return Err(Error::Conflict(format!(
            "duplicate destinations: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

fn naming_error(e: NamingError) -> Error {
    Error::validation(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{BatchPublisher, PublisherFactory};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use futures::FutureExt;
    use mediasort_db::pool::init_memory_pool;
    use mediasort_naming::{Assignment, FileInfo};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<BatchQueuedMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl BatchPublisher for RecordingPublisher {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn publish(&self, message: &BatchQueuedMessage) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    fn queue_with(publisher: Arc<RecordingPublisher>) -> BatchQueue {
        let factory: PublisherFactory = Arc::new(move || {
            let publisher = Arc::clone(&publisher) as Arc<dyn BatchPublisher>;
            async move { Ok::<_, anyhow::Error>(publisher) }.boxed()
        });
        BatchQueue::new(
            init_memory_pool().unwrap(),
            Arc::new(SharedPublisher::with_factory(factory)),
            AppState::new(),
        )
    }

    fn episode(n: u32, destination: &str) -> QueuedItem {
        QueuedItem {
            path: format!("/pending/Show/e{n}.mkv"),
            assignment: Assignment::Episode {
                series: "Show".into(),
                season: 1,
                episode: n,
                title: String::new(),
                source: format!("Show/e{n}.mkv"),
                destination: destination.into(),
            },
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_publishes() {
        let publisher = Arc::new(RecordingPublisher::default());
        let queue = queue_with(publisher.clone());

        let batch = queue
            .submit(
                "Show",
                vec![
                    episode(1, "Show/Season 01/Show - S01E01.mkv"),
                    episode(2, "Show/Season 01/Show - S01E02.mkv"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(batch.status, BatchStatus::Queued);
        assert_eq!(queue.get(batch.id).await.unwrap(), batch);
        assert_eq!(
            *publisher.sent.lock(),
            vec![BatchQueuedMessage::new(batch.id, "Show")]
        );
    }

    #[tokio::test]
    async fn test_duplicate_destinations_rejected_before_storage() {
        let publisher = Arc::new(RecordingPublisher::default());
        let queue = queue_with(publisher.clone());

        let err = queue
            .submit(
                "Show",
                vec![
                    episode(1, "Show/Season 01/Show - S01E01.mkv"),
                    episode(2, "Show/Season 01/Show - S01E01.mkv"),
                ],
            )
            .await
            .unwrap_err();

        assert_matches!(err, Error::Conflict(ref msg) if msg.contains("S01E01"));
        assert!(queue.list(None, None).await.unwrap().is_empty());
        assert!(publisher.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submissions() {
        let queue = queue_with(Arc::new(RecordingPublisher::default()));

        let err = queue
            .submit("  ", vec![episode(1, "Show/Season 01/a.mkv")])
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);

        let err = queue.submit("Show", vec![]).await.unwrap_err();
        assert_eq!(err.http_status(), 400);

        let err = queue
            .submit("Show", vec![episode(1, "Other/Season 01/a.mkv")])
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_batch() {
        let queue = queue_with(Arc::new(RecordingPublisher {
            fail: true,
            ..Default::default()
        }));

        let err = queue
            .submit("Show", vec![episode(1, "Show/Season 01/a.mkv")])
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 502);

        let stored = queue.list(None, None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(err.to_string().contains(&stored[0].id.to_string()));
    }

    #[tokio::test]
    async fn test_submit_entries_builds_assignments() {
        let publisher = Arc::new(RecordingPublisher::default());
        let queue = queue_with(publisher.clone());
        let entries = vec![
            VideoEntry::season(FileInfo::new("/pending/Show/a.mkv", "a.mkv"), 1, 0),
            VideoEntry::extra(FileInfo::new("/pending/Show/b.mp4", "b.mp4"), 0),
        ];

        let batch = queue
            .submit_entries("/pending/Show", None, &entries)
            .await
            .unwrap();
        let destinations: Vec<&str> = batch
            .items
            .iter()
            .map(|i| i.assignment.destination())
            .collect();
        assert_eq!(
            destinations,
            vec!["Show/Season 01/Show - S01E01.mkv", "Show/Extras/b.mp4"]
        );
        assert_eq!(publisher.sent.lock()[0].directory, "/pending/Show");
    }

    #[tokio::test]
    async fn test_update_delete_republish() {
        let publisher = Arc::new(RecordingPublisher::default());
        let queue = queue_with(publisher.clone());
        let batch = queue
            .submit("Show", vec![episode(1, "Show/Season 01/a.mkv")])
            .await
            .unwrap();

        let updated = queue
            .update(
                batch.id,
                BatchUpdate {
                    status: Some(BatchStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, BatchStatus::Completed);
        assert_eq!(updated.items, batch.items);

        assert_eq!(
            queue.update(batch.id, BatchUpdate::default()).await.unwrap_err().http_status(),
            400
        );

        queue.republish(batch.id).await.unwrap();
        assert_eq!(publisher.sent.lock().len(), 2);

        queue.delete(batch.id).await.unwrap();
        assert_matches!(queue.get(batch.id).await, Err(Error::NotFound { .. }));
        assert_matches!(queue.republish(batch.id).await, Err(Error::NotFound { .. }));
        assert_matches!(queue.delete(batch.id).await, Err(Error::NotFound { .. }));
    }

    #[test]
    fn test_default_series_name() {
        assert_eq!(default_series_name("/pending/Breaking Bad"), "Breaking Bad");
        assert_eq!(default_series_name("Show/"), "Show");
        assert_eq!(default_series_name("."), "Root Directory");
        assert_eq!(default_series_name(""), "Root Directory");
        assert_eq!(default_series_name("/"), "Root Directory");
    }
}
