//! Single-flight wrapper around [`SyncService`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use super::sync_service::{SyncReport, SyncService};
use crate::error::GatewayError;

/// Shortest period the periodic loop will tick at.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Serializes sync runs between the periodic loop and manual triggers.
///
/// At most one run is in flight. A trigger that arrives while a run is in
/// progress is refused with [`GatewayError::SyncInProgress`] rather than
/// queued.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    sync: SyncService,
    running: Arc<Mutex<()>>,
}

impl SyncScheduler {
    /// Creates a scheduler over `sync`.
    #[must_use]
    pub fn new(sync: SyncService) -> Self {
        Self {
            sync,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// The wrapped sync service.
    #[must_use]
    pub const fn sync(&self) -> &SyncService {
        &self.sync
    }

    /// Runs one sync now.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SyncInProgress`] if a run is already in
    /// flight, otherwise whatever [`SyncService::run`] returns.
    pub async fn trigger(&self) -> Result<SyncReport, GatewayError> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(GatewayError::SyncInProgress);
        };
        self.sync.run().await
    }

    /// Runs a sync every `every`, starting immediately.
    ///
    /// Failures are logged and the loop keeps going; the next tick resumes
    /// from the last committed watermark. Periods shorter than one second
    /// are raised to one second.
    pub async fn run_periodic(&self, every: Duration) {
        if every < MIN_PERIOD {
            tracing::warn!(requested = ?every, "sync interval too short; using one second");
        }
        let mut ticker = tokio::time::interval(every.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.trigger().await {
                Ok(report) => tracing::debug!(
                    records = report.records_applied,
                    "scheduled sync finished"
                ),
                Err(GatewayError::SyncInProgress) => {
                    tracing::info!("skipping scheduled sync; a run is already in progress");
                }
                Err(e) => tracing::warn!(error = %e, "scheduled sync failed"),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;
    use crate::provider::EventsProvider;
    use crate::testing::{ScriptedProvider, feed_record, page_of};

    fn scheduler(provider: ScriptedProvider) -> SyncScheduler {
        let provider: Arc<dyn EventsProvider> = Arc::new(provider);
        SyncScheduler::new(SyncService::new(provider, Arc::new(InMemoryStore::new())))
    }

    #[tokio::test]
    async fn trigger_runs_a_sync() {
        let scheduler = scheduler(ScriptedProvider::with_pages(vec![page_of(
            vec![feed_record(
                "e1",
                "p1",
                "published",
                "2024-05-01T10:00:00+00:00",
                "2030-01-01T00:00:00+00:00",
            )],
            None,
        )]));

        let report = tokio_test::assert_ok!(scheduler.trigger().await);
        assert_eq!(report.records_applied, 1);
        assert!(matches!(scheduler.sync().status().await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn overlapping_trigger_is_refused() {
        let scheduler = scheduler(ScriptedProvider::with_pages(vec![page_of(vec![], None)]));

        let guard = scheduler.running.lock().await;
        let refused = tokio_test::assert_err!(scheduler.trigger().await);
        assert!(matches!(refused, GatewayError::SyncInProgress));
        drop(guard);

        tokio_test::assert_ok!(scheduler.trigger().await);
    }

    #[tokio::test]
    async fn clones_share_the_run_lock() {
        let scheduler = scheduler(ScriptedProvider::default());
        let other = scheduler.clone();

        let _guard = scheduler.running.lock().await;
        assert!(matches!(
            other.trigger().await,
            Err(GatewayError::SyncInProgress)
        ));
    }

    #[tokio::test]
    async fn zero_period_keeps_the_loop_alive() {
        let provider = Arc::new(ScriptedProvider::with_pages(vec![page_of(vec![], None)]));
        let sync = SyncService::new(
            Arc::clone(&provider) as Arc<dyn EventsProvider>,
            Arc::new(InMemoryStore::new()),
        );
        let scheduler = SyncScheduler::new(sync);

        let handle = tokio::spawn(async move { scheduler.run_periodic(Duration::ZERO).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!handle.is_finished(), "periodic loop must keep running");
        assert_eq!(provider.calls(), vec!["since:2000-01-01"]);
        handle.abort();
        let Err(err) = handle.await else {
            panic!("aborted loop cannot complete");
        };
        assert!(err.is_cancelled());
    }
}
