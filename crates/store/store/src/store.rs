use async_trait::async_trait;

use paraph_core::{CompanyId, SessionId, SessionStatus, SignatureSession};

use crate::error::SessionStoreError;

/// Trait for persisting signature sessions.
///
/// The store is the single source of truth for session status. Sessions are
/// never physically deleted; terminal sessions stay readable for polling and
/// audit. Implementations must be `Send + Sync` and safe for concurrent
/// access.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save a session, overwriting any previous record with the same id.
    async fn save(&self, session: &SignatureSession) -> Result<(), SessionStoreError>;

    /// Look up a session by id. Returns `None` if not found.
    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SignatureSession>, SessionStoreError>;

    /// Look up a session by id, scoped to a company.
    ///
    /// A session owned by a different company is reported as `None`, exactly
    /// like a missing one, so callers cannot probe for existence across
    /// tenants.
    async fn find_for_company(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
    ) -> Result<Option<SignatureSession>, SessionStoreError>;

    /// Save a session only if the stored record currently has `expected`
    /// status. Returns `true` if the swap happened, `false` if the session
    /// is missing or its status changed underneath.
    ///
    /// Status transitions go through this method so that two writers racing
    /// on the same session (e.g. a completion callback against a lazy expiry
    /// check) cannot overwrite a terminal state.
    async fn save_if_status(
        &self,
        session: &SignatureSession,
        expected: SessionStatus,
    ) -> Result<bool, SessionStoreError>;

    /// List all sessions whose status is non-terminal.
    ///
    /// This scans the whole store on some backends. Use sparingly; it exists
    /// for housekeeping sweeps, not per-request paths.
    async fn scan_open(&self) -> Result<Vec<SignatureSession>, SessionStoreError>;
}
