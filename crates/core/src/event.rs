use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::session::SignatureSession;
use crate::types::{SessionId, TabletId};

/// Handles for retrieving the artifacts of a completed session.
///
/// These are opaque to the core: the embedding service decides what a
/// handle looks like (typically URLs on its own public surface).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalHandles {
    /// Where the signed document can be fetched.
    pub signed_document: String,
    /// Where the raw signature image can be fetched.
    pub signature_image: String,
}

/// Lifecycle event broadcast to the workstations of a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A signature flow was pushed to a tablet.
    Started {
        session_id: SessionId,
        document: DocumentRef,
        tablet_id: TabletId,
        signer_name: String,
        expires_at: DateTime<Utc>,
    },
    /// A signature was received and the session completed.
    Completed {
        session_id: SessionId,
        document: DocumentRef,
        signed_at: DateTime<Utc>,
        handles: RetrievalHandles,
    },
    /// The session was cancelled by a user.
    Cancelled {
        session_id: SessionId,
        document: DocumentRef,
        cancelled_by: String,
        reason: String,
    },
    /// The session ended without a signature.
    Failed {
        session_id: SessionId,
        document: DocumentRef,
        reason: String,
    },
}

impl SessionEvent {
    /// Event announcing a freshly dispatched session.
    #[must_use]
    pub fn started(session: &SignatureSession) -> Self {
        Self::Started {
            session_id: session.session_id.clone(),
            document: session.document.clone(),
            tablet_id: session.tablet_id.clone(),
            signer_name: session.signer_name.clone(),
            expires_at: session.expires_at,
        }
    }

    /// Event announcing a completed session.
    #[must_use]
    pub fn completed(
        session: &SignatureSession,
        signed_at: DateTime<Utc>,
        handles: RetrievalHandles,
    ) -> Self {
        Self::Completed {
            session_id: session.session_id.clone(),
            document: session.document.clone(),
            signed_at,
            handles,
        }
    }

    /// Event announcing a cancelled session.
    #[must_use]
    pub fn cancelled(session: &SignatureSession) -> Self {
        Self::Cancelled {
            session_id: session.session_id.clone(),
            document: session.document.clone(),
            cancelled_by: session.cancelled_by.clone().unwrap_or_default(),
            reason: session.cancel_reason.clone().unwrap_or_default(),
        }
    }

    /// Event announcing a failed session.
    #[must_use]
    pub fn failed(session: &SignatureSession, reason: impl Into<String>) -> Self {
        Self::Failed {
            session_id: session.session_id.clone(),
            document: session.document.clone(),
            reason: reason.into(),
        }
    }

    /// The session the event refers to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Started { session_id, .. }
            | Self::Completed { session_id, .. }
            | Self::Cancelled { session_id, .. }
            | Self::Failed { session_id, .. } => session_id,
        }
    }
}

/// Progress report sent by a tablet while a session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The signer opened the document.
    DocumentOpened,
    /// The signer started drawing a signature.
    SigningStarted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CreateSessionRequest;
    use crate::types::CompanyId;

    fn session() -> SignatureSession {
        SignatureSession::new(&CreateSessionRequest::new(
            DocumentRef::invoice("inv-3"),
            TabletId::new("tablet-7"),
            CompanyId::new("company-1"),
            "Dana Signer",
        ))
    }

    #[test]
    fn started_event_carries_session_fields() {
        let session = session();
        let event = SessionEvent::started(&session);
        assert_eq!(event.session_id(), &session.session_id);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "started");
        assert_eq!(json["signer_name"], "Dana Signer");
        assert_eq!(json["document"]["id"], "inv-3");
    }

    #[test]
    fn completed_event_serializes_handles() {
        let session = session();
        let handles = RetrievalHandles {
            signed_document: "/sessions/s1/document".into(),
            signature_image: "/sessions/s1/image".into(),
        };
        let event = SessionEvent::completed(&session, Utc::now(), handles.clone());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "completed");
        assert_eq!(json["handles"]["signed_document"], handles.signed_document);
    }

    #[test]
    fn cancelled_event_defaults_missing_fields() {
        let session = session();
        let event = SessionEvent::cancelled(&session);
        match event {
            SessionEvent::Cancelled {
                cancelled_by,
                reason,
                ..
            } => {
                assert!(cancelled_by.is_empty());
                assert!(reason.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn progress_event_serde() {
        let json = serde_json::to_string(&ProgressEvent::DocumentOpened).unwrap();
        assert_eq!(json, "\"document_opened\"");
    }
}
