use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentRef;
use crate::request::CreateSessionRequest;
use crate::types::{CompanyId, SessionId, TabletId};

/// Lifecycle state of a signature session.
///
/// The main path moves forward through
/// `Pending → SentToTablet → ViewingDocument → SigningInProgress → Completed`.
/// From any non-terminal state a session may instead end in `Expired`,
/// `Cancelled` or `Error`. Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created but not yet pushed to the tablet.
    Pending,
    /// The request was delivered to the tablet.
    SentToTablet,
    /// The signer opened the document on the tablet.
    ViewingDocument,
    /// The signer started drawing a signature.
    SigningInProgress,
    /// A signature was received and accepted.
    Completed,
    /// The session passed its deadline before completing.
    Expired,
    /// The session was cancelled by a user.
    Cancelled,
    /// Dispatch to the tablet failed.
    Error,
}

impl SessionStatus {
    /// Returns `true` for states that never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Expired | Self::Cancelled | Self::Error
        )
    }

    /// Position of a state on the main signing path. Terminal failure
    /// states sort last; they are screened out before ranks are compared.
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::SentToTablet => 1,
            Self::ViewingDocument => 2,
            Self::SigningInProgress => 3,
            Self::Completed => 4,
            Self::Expired | Self::Cancelled | Self::Error => u8::MAX,
        }
    }

    /// Returns `true` if moving from `self` to `to` is a legal transition.
    ///
    /// Forward moves along the main path may skip intermediate states (a
    /// tablet is not required to report every progress step). Any
    /// non-terminal state may move to `Expired`, `Cancelled` or `Error`.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() || self == to {
            return false;
        }
        match to {
            Self::Expired | Self::Cancelled | Self::Error => true,
            _ => to.rank() > self.rank(),
        }
    }

    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SentToTablet => "sent_to_tablet",
            Self::ViewingDocument => "viewing_document",
            Self::SigningInProgress => "signing_in_progress",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end-to-end attempt to collect a signature for one document on one
/// tablet.
///
/// Sessions are created and mutated only by the orchestrator and are never
/// physically deleted; terminal sessions remain readable for polling and
/// audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSession {
    /// Unique session identifier.
    pub session_id: SessionId,

    /// The business document being signed.
    pub document: DocumentRef,

    /// Target tablet device.
    pub tablet_id: TabletId,

    /// Company that owns this session. Every read and write is scoped by it.
    pub company_id: CompanyId,

    /// Name of the person expected to sign.
    pub signer_name: String,

    /// Caption shown above the signature field (e.g. "Received by").
    pub signature_title: String,

    /// Free-text instructions shown to the signer.
    pub instructions: String,

    /// Current lifecycle state.
    pub status: SessionStatus,

    /// User that requested the session.
    pub created_by: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Deadline after which the session counts as expired.
    pub expires_at: DateTime<Utc>,

    /// When the signature callback was accepted.
    pub signed_at: Option<DateTime<Utc>>,

    /// User that cancelled the session.
    pub cancelled_by: Option<String>,

    /// Reason given on cancellation.
    pub cancel_reason: Option<String>,

    /// Error detail recorded when dispatch failed.
    pub error_message: Option<String>,
}

impl SignatureSession {
    /// Create a new session in `Pending` state from a creation request.
    /// Generates a UUID-v4 session id and stamps `created_at` with now.
    /// A timeout beyond the representable range clamps the deadline to the
    /// far future instead of truncating it.
    #[must_use]
    pub fn new(request: &CreateSessionRequest) -> Self {
        let created_at = Utc::now();
        let timeout = Duration::from_std(request.timeout).unwrap_or(Duration::MAX);
        let expires_at = created_at
            .checked_add_signed(timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            session_id: SessionId::generate(),
            document: request.document.clone(),
            tablet_id: request.tablet_id.clone(),
            company_id: request.company_id.clone(),
            signer_name: request.signer_name.clone(),
            signature_title: request.signature_title.clone(),
            instructions: request.instructions.clone(),
            status: SessionStatus::Pending,
            created_by: request.created_by.clone(),
            created_at,
            expires_at,
            signed_at: None,
            cancelled_by: None,
            cancel_reason: None,
            error_message: None,
        }
    }

    /// Returns `true` if the session is past its deadline but not yet in a
    /// terminal state, i.e. it should be marked `Expired` on next observation.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    use crate::request::CreateSessionRequest;

    fn request() -> CreateSessionRequest {
        CreateSessionRequest::new(
            DocumentRef::invoice("inv-1"),
            TabletId::new("tablet-1"),
            CompanyId::new("company-1"),
            "Alex Smith",
        )
    }

    #[test]
    fn terminal_states() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Expired.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(SessionStatus::Error.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::SigningInProgress.is_terminal());
    }

    #[test]
    fn forward_transitions_allowed() {
        use SessionStatus::{
            Completed, Pending, SentToTablet, SigningInProgress, ViewingDocument,
        };
        assert!(Pending.can_transition_to(SentToTablet));
        assert!(SentToTablet.can_transition_to(ViewingDocument));
        assert!(ViewingDocument.can_transition_to(SigningInProgress));
        assert!(SigningInProgress.can_transition_to(Completed));
        // Progress reports may skip states.
        assert!(SentToTablet.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Completed));
    }

    #[test]
    fn backward_transitions_rejected() {
        use SessionStatus::{SentToTablet, SigningInProgress, ViewingDocument};
        assert!(!ViewingDocument.can_transition_to(SentToTablet));
        assert!(!SigningInProgress.can_transition_to(ViewingDocument));
        assert!(!SentToTablet.can_transition_to(SentToTablet));
    }

    #[test]
    fn nothing_leaves_a_terminal_state() {
        use SessionStatus::{Cancelled, Completed, Error, Expired};
        for terminal in [Completed, Expired, Cancelled, Error] {
            for target in [
                SessionStatus::Pending,
                SessionStatus::SentToTablet,
                SessionStatus::ViewingDocument,
                SessionStatus::SigningInProgress,
                Completed,
                Expired,
                Cancelled,
                Error,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{terminal} must not transition to {target}"
                );
            }
        }
    }

    #[test]
    fn any_non_terminal_may_fail() {
        use SessionStatus::{Cancelled, Error, Expired};
        for from in [
            SessionStatus::Pending,
            SessionStatus::SentToTablet,
            SessionStatus::ViewingDocument,
            SessionStatus::SigningInProgress,
        ] {
            assert!(from.can_transition_to(Expired));
            assert!(from.can_transition_to(Cancelled));
            assert!(from.can_transition_to(Error));
        }
    }

    #[test]
    fn session_creation_sets_expiry() {
        let session =
            SignatureSession::new(&request().with_timeout(StdDuration::from_secs(600)));
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.expires_at - session.created_at, Duration::seconds(600));
        assert!(session.signed_at.is_none());
    }

    #[test]
    fn oversized_timeout_clamps_to_the_far_future() {
        // Too large for chrono's duration type at all.
        let session = SignatureSession::new(&request().with_timeout(StdDuration::MAX));
        assert!(session.expires_at > session.created_at);
        assert!(!session.is_expired_at(Utc::now()));

        // Representable as a duration but past the end of the calendar.
        let session =
            SignatureSession::new(&request().with_timeout(StdDuration::from_secs(1 << 50)));
        assert!(session.expires_at > session.created_at);
        assert!(!session.is_expired_at(session.created_at + Duration::days(365_000)));
    }

    #[test]
    fn expiry_check_respects_deadline_and_terminal_states() {
        let mut session =
            SignatureSession::new(&request().with_timeout(StdDuration::from_secs(60)));
        let before = session.expires_at - Duration::seconds(1);
        let after = session.expires_at + Duration::seconds(1);

        assert!(!session.is_expired_at(before));
        assert!(session.is_expired_at(after));

        session.status = SessionStatus::Completed;
        assert!(!session.is_expired_at(after), "terminal sessions never expire");
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&SessionStatus::SentToTablet).unwrap();
        assert_eq!(json, "\"sent_to_tablet\"");
        let back: SessionStatus = serde_json::from_str("\"viewing_document\"").unwrap();
        assert_eq!(back, SessionStatus::ViewingDocument);
    }

    #[test]
    fn session_serde_roundtrip() {
        let session = SignatureSession::new(&request());
        let json = serde_json::to_string(&session).unwrap();
        let back: SignatureSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, session.session_id);
        assert_eq!(back.status, session.status);
        assert_eq!(back.document, session.document);
    }
}
