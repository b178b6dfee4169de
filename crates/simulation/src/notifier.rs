use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use paraph_core::{CompanyId, SessionEvent, SessionId};
use paraph_transport::{TransportError, WorkstationNotifier};

/// Notifier that captures every broadcast for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    failing: AtomicBool,
    events: Mutex<Vec<(CompanyId, SessionEvent)>>,
}

impl RecordingNotifier {
    /// A notifier that accepts and records every broadcast.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every broadcast fail with a connection error. Events are not
    /// recorded while failing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All captured events in broadcast order.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Events captured for a single session.
    #[must_use]
    pub fn events_for(&self, session_id: &SessionId) -> Vec<SessionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(_, e)| e.session_id() == session_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Events captured for a single company.
    #[must_use]
    pub fn events_for_company(&self, company_id: &CompanyId) -> Vec<SessionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(c, _)| c == company_id)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl WorkstationNotifier for RecordingNotifier {
    async fn broadcast(
        &self,
        company_id: &CompanyId,
        event: &SessionEvent,
    ) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            debug!(company_id = %company_id, "dropping broadcast, notifier set to fail");
            return Err(TransportError::Connection("simulated notifier outage".into()));
        }
        debug!(company_id = %company_id, session_id = %event.session_id(), "broadcast recorded");
        self.events.lock().push((company_id.clone(), event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use paraph_core::{CreateSessionRequest, DocumentRef, SignatureSession};

    use super::*;

    fn event() -> SessionEvent {
        let session = SignatureSession::new(&CreateSessionRequest::new(
            DocumentRef::invoice("inv-1"),
            "tab-1",
            "company-1",
            "Pat",
        ));
        SessionEvent::started(&session)
    }

    #[tokio::test]
    async fn filters_events_by_session() {
        let notifier = RecordingNotifier::new();
        let event = event();
        notifier
            .broadcast(&CompanyId::new("company-1"), &event)
            .await
            .unwrap();

        assert_eq!(notifier.events().len(), 1);
        assert_eq!(notifier.events_for(event.session_id()).len(), 1);
        assert!(notifier.events_for(&SessionId::new("other")).is_empty());
        assert!(
            notifier
                .events_for_company(&CompanyId::new("company-2"))
                .is_empty()
        );
    }

    #[tokio::test]
    async fn failing_notifier_rejects_broadcasts() {
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);

        let result = notifier
            .broadcast(&CompanyId::new("company-1"), &event())
            .await;
        assert!(result.is_err());
        assert!(notifier.events().is_empty());
    }
}
