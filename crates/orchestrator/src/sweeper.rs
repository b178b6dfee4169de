//! Background sweep for sessions whose deadline passed unobserved.
//!
//! Expiry is normally applied lazily, on the next status read. Sessions
//! nobody polls anymore would stay open forever, so the sweeper
//! periodically scans the open sessions and expires the overdue ones.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use paraph_core::{SessionEvent, SessionStatus};
use paraph_store::SessionStore;
use paraph_transport::WorkstationNotifier;

use crate::error::OrchestratorError;
use crate::metrics::SessionMetrics;

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often open sessions are scanned for missed deadlines
    /// (default: 60 seconds).
    pub sweep_interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Background task that expires overdue sessions.
pub struct ExpirySweeper {
    config: SweeperConfig,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn WorkstationNotifier>,
    metrics: Arc<SessionMetrics>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ExpirySweeper {
    /// Create a new sweeper over the given store.
    ///
    /// Returns the sweeper and the sender used to signal shutdown.
    pub fn new(
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn WorkstationNotifier>,
        metrics: Arc<SessionMetrics>,
        config: SweeperConfig,
    ) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                config,
                store,
                notifier,
                metrics,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run the sweeper until shutdown is signaled.
    pub async fn run(&mut self) {
        info!(interval = ?self.config.sweep_interval, "expiry sweeper starting");

        let mut sweep_interval = interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("expiry sweeper received shutdown signal");
                    break;
                }
                _ = sweep_interval.tick() => {
                    match self.sweep_once().await {
                        Ok(0) => {}
                        Ok(expired) => info!(expired, "expired overdue sessions"),
                        Err(e) => warn!(error = %e, "expiry sweep failed"),
                    }
                }
            }
        }

        info!("expiry sweeper stopped");
    }

    /// Scan the open sessions once and expire the overdue ones.
    ///
    /// Returns how many sessions this sweep moved to `Expired`. The cached
    /// payloads stay in place; they vanish with the process.
    pub async fn sweep_once(&self) -> Result<usize, OrchestratorError> {
        let now = Utc::now();
        let mut expired = 0;

        for session in self.store.scan_open().await? {
            if !session.is_expired_at(now) {
                continue;
            }

            let previous = session.status;
            let mut overdue = session;
            overdue.status = SessionStatus::Expired;
            if !self.store.save_if_status(&overdue, previous).await? {
                // Another writer got there first.
                continue;
            }

            debug!(session_id = %overdue.session_id, "session expired by sweep");
            self.metrics.increment_sessions_expired();
            expired += 1;

            let event = SessionEvent::failed(&overdue, "session expired");
            if let Err(e) = self.notifier.broadcast(&overdue.company_id, &event).await {
                warn!(error = %e, session_id = %overdue.session_id, "failed to broadcast expiry");
                self.metrics.increment_broadcast_failures();
            }
        }

        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use paraph_core::{CompanyId, CreateSessionRequest, DocumentRef, SignatureSession};
    use paraph_store_memory::MemorySessionStore;
    use paraph_transport::TransportError;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<SessionEvent>>,
    }

    #[async_trait]
    impl WorkstationNotifier for RecordingNotifier {
        async fn broadcast(
            &self,
            _company_id: &CompanyId,
            event: &SessionEvent,
        ) -> Result<(), TransportError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn session_with_timeout(timeout: Duration) -> SignatureSession {
        SignatureSession::new(
            &CreateSessionRequest::new(
                DocumentRef::invoice("inv-1"),
                "tab-1",
                "company-1",
                "Pat Signer",
            )
            .with_timeout(timeout),
        )
    }

    fn sweeper(
        store: Arc<MemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> (ExpirySweeper, mpsc::Sender<()>) {
        ExpirySweeper::new(
            store,
            notifier,
            Arc::new(SessionMetrics::default()),
            SweeperConfig {
                sweep_interval: Duration::from_millis(50),
            },
        )
    }

    #[tokio::test]
    async fn sweep_expires_only_overdue_sessions() {
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let overdue = session_with_timeout(Duration::from_millis(1));
        let fresh = session_with_timeout(Duration::from_secs(600));
        store.save(&overdue).await.unwrap();
        store.save(&fresh).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let (sweeper, _shutdown) = sweeper(Arc::clone(&store), Arc::clone(&notifier));
        let expired = sweeper.sweep_once().await.unwrap();
        assert_eq!(expired, 1);

        let swept = store
            .find_by_session_id(&overdue.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(swept.status, SessionStatus::Expired);

        let untouched = store
            .find_by_session_id(&fresh.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, SessionStatus::Pending);

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn sweep_of_empty_store_finds_nothing() {
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let (sweeper, _shutdown) = sweeper(store, notifier);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    // Paused time: the interval ticks advance virtually, the test never
    // sleeps for real. The expiry tests above compare wall-clock timestamps
    // and cannot run paused.
    #[tokio::test(start_paused = true)]
    async fn sweeper_starts_and_stops() {
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let (mut sweeper, shutdown_tx) = sweeper(store, notifier);

        let handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        // Let it tick a few times.
        tokio::time::sleep(Duration::from_millis(150)).await;

        let _ = shutdown_tx.send(()).await;

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "sweeper should stop within timeout");
    }
}
