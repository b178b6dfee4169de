use std::fmt;
use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use paraph_cache::{CachedSignatureData, PayloadCache, REPLACE_ATTACHMENT_KEY};
use paraph_core::{
    CompanyId, CreateSessionRequest, DocumentRef, ProgressEvent, RetrievalHandles, SessionEvent,
    SessionId, SessionStatus, SignatureRequest, SignatureSession,
};
use paraph_pipeline::ArtifactPipeline;
use paraph_store::SessionStore;
use paraph_transport::{TabletGateway, TabletRegistry, WorkstationNotifier};

use crate::builder::OrchestratorBuilder;
use crate::error::OrchestratorError;
use crate::metrics::SessionMetrics;
use crate::sweeper::{ExpirySweeper, SweeperConfig};

/// Confirmation returned to the creator of a session once the tablet has
/// accepted the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    /// Identifier for all further calls about this session.
    pub session_id: SessionId,
    /// Deadline after which the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Point-in-time view of a session, as returned by status polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// The session the report describes.
    pub session_id: SessionId,
    /// Status after lazy expiry was applied.
    pub status: SessionStatus,
    /// Deadline of the session.
    pub expires_at: DateTime<Utc>,
    /// When the signature was accepted, for completed sessions.
    pub signed_at: Option<DateTime<Utc>>,
    /// Error detail recorded when dispatch failed.
    pub error_message: Option<String>,
    /// Artifact handles; present only when the session is completed.
    pub handles: Option<RetrievalHandles>,
}

/// A binary artifact of a session, ready to be served for download.
#[derive(Debug, Clone)]
pub struct RetrievedArtifact {
    /// The artifact bytes.
    pub data: Bytes,
    /// MIME type of `data`.
    pub content_type: String,
    /// Suggested filename for downloads.
    pub filename: String,
}

/// What a signature callback did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The signature was accepted and the session completed.
    Completed,
    /// The session had already reached a terminal state; the callback was
    /// acknowledged without effect.
    AlreadyFinished {
        /// The terminal status found in the store.
        status: SessionStatus,
    },
}

/// The central coordinator for signature sessions.
///
/// Every session moves through the same pipeline:
/// 1. `create_session` validates the tablet, persists the session, stages
///    the document payload in the cache and dispatches to the tablet.
/// 2. The tablet reports progress and, eventually, a signature callback.
/// 3. `process_signature_callback` applies the signature atomically to the
///    cached payload, completes the session and runs best-effort
///    post-acceptance work (artifact publication, workstation broadcast).
/// 4. Workstations poll `session_status` and fetch artifacts.
///
/// The session store is the single source of truth for status; every status
/// transition goes through a conditional write so racing writers cannot
/// overwrite a terminal state.
pub struct SessionOrchestrator {
    // Note: manual `Debug` impl below because trait objects lack `Debug`.
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) cache: Arc<dyn PayloadCache>,
    pub(crate) registry: Arc<dyn TabletRegistry>,
    pub(crate) tablets: Arc<dyn TabletGateway>,
    pub(crate) notifier: Arc<dyn WorkstationNotifier>,
    pub(crate) pipeline: ArtifactPipeline,
    pub(crate) metrics: Arc<SessionMetrics>,
    pub(crate) external_url: String,
}

impl fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("pipeline", &self.pipeline)
            .field("external_url", &self.external_url)
            .finish_non_exhaustive()
    }
}

impl SessionOrchestrator {
    /// Start building an orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Lifecycle metrics for this orchestrator.
    #[must_use]
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Create an expiry sweeper sharing this orchestrator's store, notifier
    /// and metrics.
    ///
    /// Returns the sweeper and the sender used to signal shutdown.
    #[must_use]
    pub fn expiry_sweeper(
        &self,
        config: SweeperConfig,
    ) -> (ExpirySweeper, tokio::sync::mpsc::Sender<()>) {
        ExpirySweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            Arc::clone(&self.metrics),
            config,
        )
    }

    /// Start a new signature session and push the document to the target
    /// tablet.
    ///
    /// Nothing is persisted until the tablet has passed the registry and
    /// reachability checks. A dispatch refusal after that point leaves an
    /// `Error` session behind and drops the cached payload.
    #[instrument(
        name = "orchestrator.create_session",
        skip(self, request),
        fields(
            document = %request.document,
            tablet_id = %request.tablet_id,
            company_id = %request.company_id,
        )
    )]
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CreatedSession, OrchestratorError> {
        if request.timeout.is_zero() {
            return Err(OrchestratorError::Configuration(
                "session timeout must be positive".into(),
            ));
        }

        // 1. The tablet must be registered to the company, online and reachable.
        let device = self
            .registry
            .find(&request.tablet_id, &request.company_id)
            .await
            .map_err(|e| OrchestratorError::TabletUnavailable(e.to_string()))?
            .ok_or_else(|| {
                OrchestratorError::TabletUnavailable(format!(
                    "tablet {} is not registered for this company",
                    request.tablet_id
                ))
            })?;
        if !device.online {
            return Err(OrchestratorError::TabletUnavailable(format!(
                "tablet {} is offline",
                device.tablet_id
            )));
        }
        let reachable = match self.tablets.is_reachable(&request.tablet_id).await {
            Ok(reachable) => reachable,
            Err(e) => {
                warn!(error = %e, "reachability probe failed");
                false
            }
        };
        if !reachable {
            return Err(OrchestratorError::TabletUnavailable(format!(
                "tablet {} has no live connection",
                request.tablet_id
            )));
        }

        // 2. Get or generate the unsigned document before creating any state.
        let document_pdf = self.pipeline.unsigned_document(&request.document).await?;

        // 3. Persist the session and stage its payload.
        let session = SignatureSession::new(&request);
        self.store.save(&session).await?;

        let mut payload =
            CachedSignatureData::new(&session, document_pdf.clone(), "application/pdf");
        if request.replace_attachment {
            payload = payload.with_metadata(REPLACE_ATTACHMENT_KEY, serde_json::Value::Bool(true));
        }
        self.cache.put(payload).await?;

        // 4. Push the request to the tablet.
        let wire = SignatureRequest::for_session(&session, "application/pdf");
        let accepted = match self
            .tablets
            .send_request(&session.tablet_id, &wire, document_pdf)
            .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "tablet dispatch failed");
                false
            }
        };
        if !accepted {
            return Err(self.record_dispatch_failure(session).await);
        }

        // 5. Mark the session as delivered.
        let mut delivered = session;
        delivered.status = SessionStatus::SentToTablet;
        if !self
            .store
            .save_if_status(&delivered, SessionStatus::Pending)
            .await?
        {
            warn!(session_id = %delivered.session_id, "session changed state during dispatch");
        }

        // 6. Tell the workstations a signature flow started. Best-effort.
        if let Err(e) = self
            .notifier
            .broadcast(&delivered.company_id, &SessionEvent::started(&delivered))
            .await
        {
            warn!(error = %e, "failed to broadcast session start");
            self.metrics.increment_broadcast_failures();
        }

        self.metrics.increment_sessions_created();
        info!(
            session_id = %delivered.session_id,
            expires_at = %delivered.expires_at,
            "session dispatched"
        );

        Ok(CreatedSession {
            session_id: delivered.session_id,
            expires_at: delivered.expires_at,
        })
    }

    /// Accept a signature reported by a tablet.
    ///
    /// Arrives on an arbitrary task, uncorrelated with the request that
    /// created the session. The first callback for a session wins; duplicate
    /// deliveries are acknowledged without changing the stored signature.
    /// Everything after the completion transition is best-effort and never
    /// rolls it back.
    #[instrument(
        name = "orchestrator.signature_callback",
        skip(self, signature_base64),
        fields(session_id = %session_id)
    )]
    pub async fn process_signature_callback(
        &self,
        session_id: &SessionId,
        signature_base64: &str,
    ) -> Result<CallbackOutcome, OrchestratorError> {
        // 1. Decode before touching any state.
        let image = decode_signature(signature_base64)?;
        let received_at = Utc::now();

        // 2. Attach the signature to the cached payload. The update is one
        //    indivisible read-modify-write; the first signature wins.
        let payload = self
            .cache
            .update_atomic(
                session_id,
                Box::new(move |payload| {
                    payload.apply_signature(image, received_at);
                }),
            )
            .await?
            .ok_or(OrchestratorError::SessionNotFound)?;
        let signed_at = payload.signed_at.unwrap_or(received_at);

        // 3. Move the authoritative record to completed, unless it already
        //    reached a terminal state.
        let Some(mut session) = self.store.find_by_session_id(session_id).await? else {
            warn!("cached payload exists for a session the store does not know");
            return Err(OrchestratorError::SessionNotFound);
        };
        loop {
            if session.status.is_terminal() {
                info!(status = %session.status, "ignoring signature callback for finished session");
                self.metrics.increment_callbacks_ignored();
                return Ok(CallbackOutcome::AlreadyFinished {
                    status: session.status,
                });
            }
            let previous = session.status;
            session.status = SessionStatus::Completed;
            session.signed_at = Some(signed_at);
            if self.store.save_if_status(&session, previous).await? {
                break;
            }
            // Lost the swap to a concurrent writer; reload and re-judge.
            session = self
                .store
                .find_by_session_id(session_id)
                .await?
                .ok_or(OrchestratorError::SessionNotFound)?;
        }

        // 4. Replace the document's attachment with the signed rendition if
        //    the payload asked for it. Failures are logged, never fatal.
        if payload.replace_attachment_requested() {
            if let Err(e) = self
                .pipeline
                .publish_signed(
                    &session.document,
                    payload.signature_image.clone(),
                    &payload.signer_name,
                )
                .await
            {
                warn!(error = %e, "failed to publish signed attachment");
                self.metrics.increment_artifact_failures();
            }
        }

        // 5. Tell the workstations, with handles for both artifacts.
        let handles = self.retrieval_handles(session_id);
        let event = SessionEvent::completed(&session, signed_at, handles);
        if let Err(e) = self.notifier.broadcast(&session.company_id, &event).await {
            warn!(error = %e, "failed to broadcast completion");
            self.metrics.increment_broadcast_failures();
        }

        self.metrics.increment_callbacks_completed();
        info!(signed_at = %signed_at, "session completed");
        Ok(CallbackOutcome::Completed)
    }

    /// Transport-facing wrapper around
    /// [`process_signature_callback`](Self::process_signature_callback).
    ///
    /// Returns the acknowledgement flag sent back to the tablet: `true` when
    /// the signature was stored (or the session had already finished),
    /// `false` when the callback was rejected. Never propagates an error to
    /// the connection.
    pub async fn handle_signature_callback(
        &self,
        session_id: &SessionId,
        signature_base64: &str,
    ) -> bool {
        match self
            .process_signature_callback(session_id, signature_base64)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "signature callback rejected");
                self.metrics.increment_callbacks_rejected();
                false
            }
        }
    }

    /// Report the current status of a session.
    ///
    /// Reading is where expiry is observed: a non-terminal session past its
    /// deadline moves to `Expired` as a side effect of this call. Retrieval
    /// handles are included only for completed sessions.
    #[instrument(
        name = "orchestrator.session_status",
        skip(self, document),
        fields(session_id = %session_id, company_id = %company_id)
    )]
    pub async fn session_status(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
        document: &DocumentRef,
    ) -> Result<StatusReport, OrchestratorError> {
        let session = self.load_scoped(session_id, company_id, document).await?;
        let session = self.observe_expiry(session).await?;

        let handles = (session.status == SessionStatus::Completed)
            .then(|| self.retrieval_handles(session_id));

        Ok(StatusReport {
            session_id: session.session_id,
            status: session.status,
            expires_at: session.expires_at,
            signed_at: session.signed_at,
            error_message: session.error_message,
            handles,
        })
    }

    /// Cancel an open session on behalf of a workstation user.
    ///
    /// The cached payload is removed immediately, so a signature callback
    /// arriving after the cancel fails with `SessionNotFound` instead of
    /// resurrecting the session. The tablet and the company's workstations
    /// are notified best-effort.
    #[instrument(
        name = "orchestrator.cancel_session",
        skip(self, document, reason),
        fields(session_id = %session_id, company_id = %company_id)
    )]
    pub async fn cancel_session(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
        document: &DocumentRef,
        cancelled_by: &str,
        reason: &str,
    ) -> Result<(), OrchestratorError> {
        let mut session = self.load_scoped(session_id, company_id, document).await?;

        // 1. Flip the record to cancelled. Finished sessions stay as they are.
        loop {
            if session.status.is_terminal() {
                return Err(OrchestratorError::InvalidState(session.status));
            }
            let previous = session.status;
            session.status = SessionStatus::Cancelled;
            session.cancelled_by = Some(cancelled_by.to_owned());
            session.cancel_reason = Some(reason.to_owned());
            if self.store.save_if_status(&session, previous).await? {
                break;
            }
            session = self
                .store
                .find_by_session_id(session_id)
                .await?
                .ok_or(OrchestratorError::SessionNotFound)?;
        }
        self.metrics.increment_sessions_cancelled();

        // 2. Drop the payload so a late callback cannot resurrect the session.
        if let Err(e) = self.cache.remove(session_id).await {
            warn!(error = %e, "failed to drop cached payload");
        }

        // 3. Best-effort notifications to the tablet and the workstations.
        if let Err(e) = self
            .tablets
            .notify_cancelled(&session.tablet_id, session_id)
            .await
        {
            warn!(error = %e, "failed to notify tablet of cancellation");
        }
        if let Err(e) = self
            .notifier
            .broadcast(&session.company_id, &SessionEvent::cancelled(&session))
            .await
        {
            warn!(error = %e, "failed to broadcast cancellation");
            self.metrics.increment_broadcast_failures();
        }

        info!(cancelled_by, "session cancelled");
        Ok(())
    }

    /// Fetch the signed rendition of the session's document.
    ///
    /// Returns `Ok(None)` while no signature has arrived; not-yet-signed is
    /// an expected answer during polling, not a fault.
    #[instrument(
        name = "orchestrator.signed_document",
        skip(self, document),
        fields(session_id = %session_id, company_id = %company_id)
    )]
    pub async fn signed_document(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
        document: &DocumentRef,
    ) -> Result<Option<RetrievedArtifact>, OrchestratorError> {
        let session = self.load_scoped(session_id, company_id, document).await?;

        let Some(payload) = self.cache.get(session_id).await? else {
            return Ok(None);
        };
        if !payload.has_signature() {
            return Ok(None);
        }

        let pdf = self
            .pipeline
            .render_signed(
                &session.document,
                payload.signature_image.clone(),
                &payload.signer_name,
            )
            .await?;

        Ok(Some(RetrievedArtifact {
            data: pdf,
            content_type: "application/pdf".to_owned(),
            filename: format!(
                "{}-{}-signed.pdf",
                session.document.kind(),
                session.document.id()
            ),
        }))
    }

    /// Fetch the raw signature image of a session.
    ///
    /// Returns `Ok(None)` while no signature has arrived.
    #[instrument(
        name = "orchestrator.signature_image",
        skip(self, document),
        fields(session_id = %session_id, company_id = %company_id)
    )]
    pub async fn signature_image(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
        document: &DocumentRef,
    ) -> Result<Option<RetrievedArtifact>, OrchestratorError> {
        self.load_scoped(session_id, company_id, document).await?;

        let Some(payload) = self.cache.get(session_id).await? else {
            return Ok(None);
        };
        if !payload.has_signature() {
            return Ok(None);
        }

        Ok(Some(RetrievedArtifact {
            data: payload.signature_image.clone(),
            content_type: "image/png".to_owned(),
            filename: format!("signature-{session_id}.png"),
        }))
    }

    /// Apply a progress report from a tablet to the session record.
    ///
    /// Reports arriving out of order or after the session finished are
    /// dropped with a log; the method returns the status as stored
    /// afterwards.
    #[instrument(
        name = "orchestrator.progress_event",
        skip(self),
        fields(session_id = %session_id, event = ?event)
    )]
    pub async fn process_progress_event(
        &self,
        session_id: &SessionId,
        event: ProgressEvent,
    ) -> Result<SessionStatus, OrchestratorError> {
        let session = self
            .store
            .find_by_session_id(session_id)
            .await?
            .ok_or(OrchestratorError::SessionNotFound)?;

        let target = match event {
            ProgressEvent::DocumentOpened => SessionStatus::ViewingDocument,
            ProgressEvent::SigningStarted => SessionStatus::SigningInProgress,
        };

        if !session.status.can_transition_to(target) {
            debug!(status = %session.status, target = %target, "dropping stale progress report");
            return Ok(session.status);
        }

        let previous = session.status;
        let mut updated = session;
        updated.status = target;
        if self.store.save_if_status(&updated, previous).await? {
            return Ok(target);
        }

        // Raced with another writer; report what the store has now.
        let status = self
            .store
            .find_by_session_id(session_id)
            .await?
            .map_or(previous, |s| s.status);
        Ok(status)
    }

    /// Load a session scoped by company and verify it belongs to `document`.
    ///
    /// A session owned by another company is indistinguishable from a
    /// missing one.
    async fn load_scoped(
        &self,
        session_id: &SessionId,
        company_id: &CompanyId,
        document: &DocumentRef,
    ) -> Result<SignatureSession, OrchestratorError> {
        let session = self
            .store
            .find_for_company(session_id, company_id)
            .await?
            .ok_or(OrchestratorError::SessionNotFound)?;
        if &session.document != document {
            return Err(OrchestratorError::SessionDocumentMismatch);
        }
        Ok(session)
    }

    /// Persist expiry for a session past its deadline.
    ///
    /// The conditional write lets exactly one concurrent observer win the
    /// transition; everyone else reads back the record as it now stands.
    async fn observe_expiry(
        &self,
        session: SignatureSession,
    ) -> Result<SignatureSession, OrchestratorError> {
        if !session.is_expired_at(Utc::now()) {
            return Ok(session);
        }

        let previous = session.status;
        let mut expired = session;
        expired.status = SessionStatus::Expired;
        if self.store.save_if_status(&expired, previous).await? {
            info!(session_id = %expired.session_id, "session expired");
            self.metrics.increment_sessions_expired();
            let event = SessionEvent::failed(&expired, "session expired");
            if let Err(e) = self.notifier.broadcast(&expired.company_id, &event).await {
                warn!(error = %e, "failed to broadcast expiry");
                self.metrics.increment_broadcast_failures();
            }
            return Ok(expired);
        }

        self.store
            .find_by_session_id(&expired.session_id)
            .await?
            .ok_or(OrchestratorError::SessionNotFound)
    }

    /// Record a refused dispatch: the session moves to `Error` and its
    /// payload is dropped so no orphaned binary data stays behind.
    async fn record_dispatch_failure(&self, session: SignatureSession) -> OrchestratorError {
        let reason = format!("tablet {} did not accept the request", session.tablet_id);

        let mut failed = session;
        failed.status = SessionStatus::Error;
        failed.error_message = Some(reason.clone());
        match self
            .store
            .save_if_status(&failed, SessionStatus::Pending)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(session_id = %failed.session_id, "session changed state during failed dispatch");
            }
            Err(e) => {
                warn!(error = %e, session_id = %failed.session_id, "failed to record dispatch error");
            }
        }

        if let Err(e) = self.cache.remove(&failed.session_id).await {
            warn!(error = %e, session_id = %failed.session_id, "failed to drop cached payload");
        }

        self.metrics.increment_dispatch_failures();
        OrchestratorError::DispatchFailed(reason)
    }

    /// Build the retrieval handles advertised for a completed session.
    fn retrieval_handles(&self, session_id: &SessionId) -> RetrievalHandles {
        RetrievalHandles {
            signed_document: format!(
                "{}/signature-sessions/{session_id}/document",
                self.external_url
            ),
            signature_image: format!(
                "{}/signature-sessions/{session_id}/image",
                self.external_url
            ),
        }
    }
}

/// Decode a base64 signature image.
///
/// Tablets send canvas exports; a `data:` URL prefix and surrounding
/// whitespace are tolerated, an empty or undecodable payload is not.
fn decode_signature(encoded: &str) -> Result<Bytes, OrchestratorError> {
    let mut trimmed = encoded.trim();
    if let Some((header, rest)) = trimmed.split_once(',')
        && header.starts_with("data:")
    {
        trimmed = rest;
    }
    if trimmed.is_empty() {
        return Err(OrchestratorError::InvalidSignaturePayload(
            "empty signature payload".into(),
        ));
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|e| OrchestratorError::InvalidSignaturePayload(e.to_string()))?;
    if decoded.is_empty() {
        return Err(OrchestratorError::InvalidSignaturePayload(
            "signature decoded to zero bytes".into(),
        ));
    }
    Ok(Bytes::from(decoded))
}
