//! Reconciliation engine: mirrors the provider feed into local storage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{SyncStatus, SyncWatermark};
use crate::error::GatewayError;
use crate::persistence::{SyncBatch, SyncStore};
use crate::provider::{EventsPaginator, EventsProvider, FeedRecord};

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SyncReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Number of feed records applied.
    pub records_applied: usize,
    /// Number of feed pages requested.
    pub pages_fetched: usize,
    /// Watermark after the run.
    pub last_changed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct RunProgress {
    records: usize,
    pages: usize,
    max_changed_at: Option<DateTime<Utc>>,
}

/// Drives the paginator, upserts every record, and advances the
/// watermark.
///
/// Concurrent runs are not supported; callers serialize them (see
/// [`super::SyncScheduler`]).
#[derive(Debug, Clone)]
pub struct SyncService {
    provider: Arc<dyn EventsProvider>,
    store: Arc<dyn SyncStore>,
}

impl SyncService {
    /// Creates a new `SyncService`.
    #[must_use]
    pub fn new(provider: Arc<dyn EventsProvider>, store: Arc<dyn SyncStore>) -> Self {
        Self { provider, store }
    }

    /// Returns the recorded watermark, or `None` before the first run.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on storage failure.
    pub async fn status(&self) -> Result<Option<SyncWatermark>, GatewayError> {
        self.store.watermark().await
    }

    /// Runs one reconciliation pass.
    ///
    /// The `running` status is committed before any record is fetched.
    /// All place/event writes commit together with `success` and the new
    /// `last_changed_at`. On failure the writes are rolled back, `error`
    /// is committed on its own, and the previous `last_changed_at` stays
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SyncFailed`] wrapping the first failure.
    pub async fn run(&self) -> Result<SyncReport, GatewayError> {
        let watermark = self
            .store
            .load_or_create_watermark()
            .await
            .map_err(|e| GatewayError::SyncFailed(Box::new(e)))?;
        let resume_from = watermark.resume_cursor();
        if watermark.sync_status == SyncStatus::Running {
            tracing::warn!(
                watermark = %resume_from,
                "previous sync run did not finish; resuming from last committed watermark"
            );
        }

        let started_at = Utc::now();
        self.store
            .mark_running(started_at)
            .await
            .map_err(|e| GatewayError::SyncFailed(Box::new(e)))?;
        tracing::info!(watermark = %resume_from, "sync started");

        let mut batch = match self.store.begin_batch().await {
            Ok(batch) => batch,
            Err(err) => return Err(self.fail(None, err).await),
        };

        let applied = self.apply_feed(&resume_from, batch.as_mut()).await;
        let progress = match applied {
            Ok(progress) => progress,
            Err(err) => return Err(self.fail(Some(batch), err).await),
        };

        if let Err(err) = batch.commit(progress.max_changed_at).await {
            return Err(self.fail(None, err).await);
        }

        let last_changed_at = progress.max_changed_at.or(watermark.last_changed_at);
        tracing::info!(
            records = progress.records,
            pages = progress.pages,
            last_changed_at = ?last_changed_at,
            "sync completed"
        );
        Ok(SyncReport {
            started_at,
            records_applied: progress.records,
            pages_fetched: progress.pages,
            last_changed_at,
        })
    }

    async fn apply_feed(
        &self,
        resume_from: &str,
        batch: &mut dyn SyncBatch,
    ) -> Result<RunProgress, GatewayError> {
        let mut paginator = EventsPaginator::new(self.provider.as_ref(), resume_from);
        let mut progress = RunProgress::default();

        while let Some(raw) = paginator.next().await? {
            let (place, event) = FeedRecord::parse(raw)?;
            // Place first: the event row references it.
            batch.upsert_place(&place).await?;
            batch.upsert_event(&event).await?;

            progress.records = progress.records.saturating_add(1);
            if progress.max_changed_at.is_none_or(|max| event.changed_at > max) {
                progress.max_changed_at = Some(event.changed_at);
            }
        }

        progress.pages = paginator.pages_fetched();
        Ok(progress)
    }

    /// Rolls back `batch`, records `error`, and wraps `cause`.
    async fn fail(&self, batch: Option<Box<dyn SyncBatch>>, cause: GatewayError) -> GatewayError {
        if let Some(batch) = batch {
            if let Err(e) = batch.rollback().await {
                tracing::error!(error = %e, "sync rollback failed");
            }
        }
        if let Err(e) = self.store.mark_error().await {
            tracing::error!(error = %e, "failed to record sync error status");
        }
        tracing::error!(error = %cause, "sync failed");
        GatewayError::SyncFailed(Box::new(cause))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;
    use crate::testing::{ScriptedProvider, feed_record, page_of};
    use serde_json::json;

    const DEADLINE: &str = "2030-01-01T00:00:00+00:00";

    fn service(provider: &Arc<ScriptedProvider>, store: &InMemoryStore) -> SyncService {
        SyncService::new(Arc::clone(provider) as Arc<dyn EventsProvider>, Arc::new(store.clone()))
    }

    async fn watermark(store: &InMemoryStore) -> SyncWatermark {
        let Ok(Some(watermark)) = store.watermark().await else {
            panic!("watermark should exist");
        };
        watermark
    }

    #[tokio::test]
    async fn first_run_starts_at_epoch_and_advances_watermark() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![
            page_of(
                vec![
                    feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE),
                    feed_record("e2", "p1", "draft", "2024-03-05T10:00:00+00:00", DEADLINE),
                ],
                Some("p2"),
            ),
            page_of(
                vec![feed_record("e3", "p2", "published", "2024-03-03T10:00:00+00:00", DEADLINE)],
                None,
            ),
        ]));
        let store = InMemoryStore::new();

        let Ok(report) = service(&provider, &store).run().await else {
            panic!("sync should succeed");
        };
        assert_eq!(report.records_applied, 3);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(provider.calls(), vec!["since:2000-01-01", "page:p2"]);

        assert_eq!(store.places().await.len(), 2);
        assert_eq!(store.events().await.len(), 3);

        let watermark = watermark(&store).await;
        assert_eq!(watermark.sync_status, SyncStatus::Success);
        assert_eq!(
            watermark.last_changed_at.map(|ts| ts.to_rfc3339()),
            Some("2024-03-05T10:00:00+00:00".to_string())
        );
        assert!(watermark.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn rerun_without_changes_is_idempotent() {
        let record = feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE);
        let provider = Arc::new(ScriptedProvider::with_pages(vec![page_of(
            vec![record.clone()],
            None,
        )]));
        let store = InMemoryStore::new();
        let sync = service(&provider, &store);

        assert!(sync.run().await.is_ok());
        let places_before = store.places().await;
        let events_before = store.events().await;
        let watermark_before = watermark(&store).await.last_changed_at;

        provider.push_page(page_of(vec![record], None));
        assert!(sync.run().await.is_ok());

        assert_eq!(store.places().await, places_before);
        assert_eq!(store.events().await, events_before);
        assert_eq!(watermark(&store).await.last_changed_at, watermark_before);
        assert_eq!(provider.calls_starting_with("since:2024-03-01"), 1);
    }

    #[tokio::test]
    async fn empty_feed_keeps_previous_watermark() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![
            page_of(
                vec![feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE)],
                None,
            ),
            page_of(vec![], None),
        ]));
        let store = InMemoryStore::new();
        let sync = service(&provider, &store);

        assert!(sync.run().await.is_ok());
        let Ok(report) = sync.run().await else {
            panic!("second sync should succeed");
        };
        assert_eq!(report.records_applied, 0);
        let watermark = watermark(&store).await;
        assert_eq!(watermark.sync_status, SyncStatus::Success);
        assert_eq!(report.last_changed_at, watermark.last_changed_at);
        assert!(watermark.last_changed_at.is_some());
    }

    #[tokio::test]
    async fn resumed_run_applies_only_later_changes() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![
            page_of(
                vec![
                    feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE),
                    feed_record("e2", "p1", "published", "2024-03-02T10:00:00+00:00", DEADLINE),
                ],
                None,
            ),
            page_of(
                vec![
                    feed_record("e2", "p1", "cancelled", "2024-03-02T12:00:00+00:00", DEADLINE),
                    feed_record("e3", "p2", "published", "2024-03-04T09:00:00+00:00", DEADLINE),
                ],
                None,
            ),
        ]));
        let store = InMemoryStore::new();
        let sync = service(&provider, &store);

        assert!(sync.run().await.is_ok());
        assert!(sync.run().await.is_ok());

        assert_eq!(provider.calls(), vec!["since:2000-01-01", "since:2024-03-02"]);
        let events = store.events().await;
        let statuses: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.id.as_str(), e.status.as_str()))
            .collect();
        assert_eq!(
            statuses,
            vec![("e1", "published"), ("e2", "cancelled"), ("e3", "published")]
        );
    }

    #[tokio::test]
    async fn event_place_can_move_between_runs() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![
            page_of(
                vec![feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE)],
                None,
            ),
            page_of(
                vec![feed_record("e1", "p2", "published", "2024-03-02T10:00:00+00:00", DEADLINE)],
                None,
            ),
        ]));
        let store = InMemoryStore::new();
        let sync = service(&provider, &store);

        assert!(sync.run().await.is_ok());
        assert!(sync.run().await.is_ok());

        let events = store.events().await;
        let [event] = events.as_slice() else {
            panic!("one event expected");
        };
        assert_eq!(event.place_id, "p2");
        assert_eq!(store.places().await.len(), 2);
    }

    #[tokio::test]
    async fn malformed_record_rolls_back_and_keeps_cursor() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![
            page_of(
                vec![feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE)],
                None,
            ),
            page_of(
                vec![
                    feed_record("e2", "p1", "published", "2024-03-05T10:00:00+00:00", DEADLINE),
                    feed_record("e3", "p3", "published", "2024-03-06T10:00:00+00:00", DEADLINE),
                    json!({"id": "e4", "name": "broken"}),
                ],
                None,
            ),
        ]));
        let store = InMemoryStore::new();
        let sync = service(&provider, &store);

        assert!(sync.run().await.is_ok());
        let before = watermark(&store).await.last_changed_at;

        let result = sync.run().await;
        let Err(GatewayError::SyncFailed(cause)) = result else {
            panic!("expected sync failure");
        };
        assert!(matches!(*cause, GatewayError::MalformedRecord(_)));

        let after = watermark(&store).await;
        assert_eq!(after.sync_status, SyncStatus::Error);
        assert_eq!(after.last_changed_at, before);
        let ids: Vec<String> = store.events().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["e1"]);
        assert_eq!(store.places().await.len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_marks_error_without_writes() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![page_of(
            vec![feed_record("e1", "p1", "published", "2024-03-01T10:00:00+00:00", DEADLINE)],
            Some("p2"),
        )]));
        let store = InMemoryStore::new();

        let result = service(&provider, &store).run().await;
        let Err(GatewayError::SyncFailed(cause)) = result else {
            panic!("expected sync failure");
        };
        assert!(matches!(*cause, GatewayError::ProviderUnavailable(_)));

        let watermark = watermark(&store).await;
        assert_eq!(watermark.sync_status, SyncStatus::Error);
        assert_eq!(watermark.last_changed_at, None);
        assert!(store.events().await.is_empty());
    }

    #[tokio::test]
    async fn status_is_none_before_first_run() {
        let provider = Arc::new(ScriptedProvider::default());
        let store = InMemoryStore::new();
        assert!(matches!(service(&provider, &store).status().await, Ok(None)));
    }
}
