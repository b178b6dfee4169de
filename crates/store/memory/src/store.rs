use async_trait::async_trait;
use dashmap::DashMap;

use paraph_core::{CompanyId, SessionId, SessionStatus, SignatureSession};
use paraph_store::error::SessionStoreError;
use paraph_store::store::SessionStore;

/// In-memory [`SessionStore`] backed by a [`DashMap`].
///
/// Records are stored as serialized JSON, the same shape a real backend
/// would persist. This implementation is fully synchronous internally; the
/// async trait methods return immediately.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: DashMap<String, String>,
}

impl MemorySessionStore {
    /// Create a new, empty in-memory session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(session: &SignatureSession) -> Result<String, SessionStoreError> {
        serde_json::to_string(session)
            .map_err(|e| SessionStoreError::Serialization(format!("encode session: {e}")))
    }

    fn decode(raw: &str) -> Result<SignatureSession, SessionStoreError> {
        serde_json::from_str(raw)
            .map_err(|e| SessionStoreError::Serialization(format!("decode session: {e}")))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &SignatureSession) -> Result<(), SessionStoreError> {
        let encoded = Self::encode(session)?;
        self.data.insert(session.session_id.to_string(), encoded);
        Ok(())
    }

    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SignatureSession>, SessionStoreError> {
        match self.data.get(session_id.as_str()) {
            Some(raw) => Ok(Some(Self::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn find_for_company(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
    ) -> Result<Option<SignatureSession>, SessionStoreError> {
        let found = self.find_by_session_id(session_id).await?;
        Ok(found.filter(|session| &session.company_id == company_id))
    }

    async fn save_if_status(
        &self,
        session: &SignatureSession,
        expected: SessionStatus,
    ) -> Result<bool, SessionStoreError> {
        // The entry guard keeps the read-compare-write in one step.
        let Some(mut entry) = self.data.get_mut(session.session_id.as_str()) else {
            return Ok(false);
        };

        let current = Self::decode(&entry)?;
        if current.status != expected {
            return Ok(false);
        }

        *entry = Self::encode(session)?;
        Ok(true)
    }

    async fn scan_open(&self) -> Result<Vec<SignatureSession>, SessionStoreError> {
        let mut open = Vec::new();
        for entry in &self.data {
            let session = Self::decode(entry.value())?;
            if !session.status.is_terminal() {
                open.push(session);
            }
        }
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use paraph_core::{CreateSessionRequest, DocumentRef};
    use paraph_store::testing::run_store_conformance_tests;

    use super::*;

    fn test_session(id: &str) -> SignatureSession {
        let mut session = SignatureSession::new(&CreateSessionRequest::new(
            DocumentRef::invoice(format!("inv-{id}")),
            "tablet-1",
            "company-1",
            "Test Signer",
        ));
        session.session_id = SessionId::new(id);
        session
    }

    #[tokio::test]
    async fn conformance() {
        let store = MemorySessionStore::new();
        run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn concurrent_swap_has_a_single_winner() {
        let store = Arc::new(MemorySessionStore::new());
        let session = test_session("race");
        store.save(&session).await.unwrap();

        let mut completed = session.clone();
        completed.status = SessionStatus::Completed;
        let mut expired = session.clone();
        expired.status = SessionStatus::Expired;

        let store_a = Arc::clone(&store);
        let store_b = Arc::clone(&store);
        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                store_a
                    .save_if_status(&completed, SessionStatus::Pending)
                    .await
                    .unwrap()
            }),
            tokio::spawn(async move {
                store_b
                    .save_if_status(&expired, SessionStatus::Pending)
                    .await
                    .unwrap()
            }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a ^ b, "exactly one of the two swaps should win");
        let status = store
            .find_by_session_id(&session.session_id)
            .await
            .unwrap()
            .unwrap()
            .status;
        assert!(status.is_terminal());
    }

    #[tokio::test]
    async fn scan_reports_only_open_sessions() {
        let store = MemorySessionStore::new();
        for (id, status) in [
            ("open-1", SessionStatus::Pending),
            ("open-2", SessionStatus::SentToTablet),
            ("done-1", SessionStatus::Completed),
            ("done-2", SessionStatus::Error),
        ] {
            let mut session = test_session(id);
            session.status = status;
            store.save(&session).await.unwrap();
        }

        let open = store.scan_open().await.unwrap();
        assert_eq!(open.len(), 2);
    }
}
