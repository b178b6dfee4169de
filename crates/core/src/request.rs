use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::session::SignatureSession;
use crate::types::{CompanyId, SessionId, TabletId};

/// Default session deadline when the caller does not specify one.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Request to start a new signature session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// The business document to be signed.
    pub document: DocumentRef,

    /// Tablet the request should be pushed to.
    pub tablet_id: TabletId,

    /// Company on whose behalf the session runs.
    pub company_id: CompanyId,

    /// Name of the person expected to sign.
    pub signer_name: String,

    /// Caption shown above the signature field.
    #[serde(default)]
    pub signature_title: String,

    /// Free-text instructions shown to the signer.
    #[serde(default)]
    pub instructions: String,

    /// User that requested the session.
    #[serde(default)]
    pub created_by: String,

    /// How long the session stays open before it expires.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Replace the document's stored attachment with the signed version
    /// once the signature arrives.
    #[serde(default)]
    pub replace_attachment: bool,
}

fn default_timeout() -> Duration {
    DEFAULT_SESSION_TIMEOUT
}

impl CreateSessionRequest {
    /// Create a request with required fields and defaults for the rest.
    #[must_use]
    pub fn new(
        document: DocumentRef,
        tablet_id: impl Into<TabletId>,
        company_id: impl Into<CompanyId>,
        signer_name: impl Into<String>,
    ) -> Self {
        Self {
            document,
            tablet_id: tablet_id.into(),
            company_id: company_id.into(),
            signer_name: signer_name.into(),
            signature_title: String::new(),
            instructions: String::new(),
            created_by: String::new(),
            timeout: DEFAULT_SESSION_TIMEOUT,
            replace_attachment: false,
        }
    }

    /// Set the signature field caption.
    #[must_use]
    pub fn with_signature_title(mut self, title: impl Into<String>) -> Self {
        self.signature_title = title.into();
        self
    }

    /// Set the instructions shown to the signer.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the requesting user.
    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Set the session deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request attachment replacement on completion.
    #[must_use]
    pub fn with_replace_attachment(mut self, replace: bool) -> Self {
        self.replace_attachment = replace;
        self
    }
}

/// Metadata pushed to a tablet alongside the document bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Session the request belongs to; echoed back in the callback.
    pub session_id: SessionId,

    /// Name of the person expected to sign.
    pub signer_name: String,

    /// Caption shown above the signature field.
    pub signature_title: String,

    /// Free-text instructions shown to the signer.
    pub instructions: String,

    /// Human-readable label of the document (e.g. `"invoice:inv-1"`).
    pub document_label: String,

    /// MIME type of the accompanying document bytes.
    pub content_type: String,

    /// Deadline after which the tablet should drop the request.
    pub expires_at: DateTime<Utc>,
}

impl SignatureRequest {
    /// Build the wire metadata for a session.
    #[must_use]
    pub fn for_session(session: &SignatureSession, content_type: impl Into<String>) -> Self {
        Self {
            session_id: session.session_id.clone(),
            signer_name: session.signer_name.clone(),
            signature_title: session.signature_title.clone(),
            instructions: session.instructions.clone(),
            document_label: session.document.to_string(),
            content_type: content_type.into(),
            expires_at: session.expires_at,
        }
    }
}
