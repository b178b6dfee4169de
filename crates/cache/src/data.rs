use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use paraph_core::{CompanyId, SessionId, SignatureSession, TabletId};

/// Metadata key requesting that the document's stored attachment be replaced
/// with the signed version after completion.
pub const REPLACE_ATTACHMENT_KEY: &str = "replace_attachment";

/// The binary payload of one in-flight signature session.
///
/// Entries live exclusively in the payload cache and are keyed by session
/// id. The document bytes are immutable once set; the signature fields are
/// empty until the signing callback arrives and immutable thereafter. The
/// cache is volatile: losing an entry on restart is accepted, the session
/// record in the store stays behind.
#[derive(Clone)]
pub struct CachedSignatureData {
    /// Session the payload belongs to.
    pub session_id: SessionId,

    /// Company scoping, mirrored from the session.
    pub company_id: CompanyId,

    /// Tablet the document was dispatched to.
    pub tablet_id: TabletId,

    /// Name of the person expected to sign.
    pub signer_name: String,

    /// The unsigned document pushed to the tablet.
    pub document_bytes: Bytes,

    /// MIME type of `document_bytes`.
    pub content_type: String,

    /// The signature image. Empty until the callback lands.
    pub signature_image: Bytes,

    /// When the signature was accepted.
    pub signed_at: Option<DateTime<Utc>>,

    /// Open key-value bag for completion-time flags.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CachedSignatureData {
    /// Create the payload for a freshly created session, with empty
    /// signature fields.
    #[must_use]
    pub fn new(
        session: &SignatureSession,
        document_bytes: Bytes,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session.session_id.clone(),
            company_id: session.company_id.clone(),
            tablet_id: session.tablet_id.clone(),
            signer_name: session.signer_name.clone(),
            document_bytes,
            content_type: content_type.into(),
            signature_image: Bytes::new(),
            signed_at: None,
            metadata: HashMap::new(),
        }
    }

    /// Set a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns `true` once a signature has been applied.
    #[must_use]
    pub fn has_signature(&self) -> bool {
        !self.signature_image.is_empty()
    }

    /// Apply a signature to the payload. The first application wins;
    /// re-applying is a no-op so duplicate callback deliveries cannot
    /// overwrite an accepted signature. Returns `true` if the signature
    /// was applied by this call.
    pub fn apply_signature(&mut self, image: Bytes, signed_at: DateTime<Utc>) -> bool {
        if self.has_signature() {
            return false;
        }
        self.signature_image = image;
        self.signed_at = Some(signed_at);
        true
    }

    /// Returns `true` if the metadata requests attachment replacement on
    /// completion.
    #[must_use]
    pub fn replace_attachment_requested(&self) -> bool {
        self.metadata
            .get(REPLACE_ATTACHMENT_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Debug for CachedSignatureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSignatureData")
            .field("session_id", &self.session_id)
            .field("company_id", &self.company_id)
            .field("tablet_id", &self.tablet_id)
            .field("signer_name", &self.signer_name)
            .field("document_bytes", &self.document_bytes.len())
            .field("content_type", &self.content_type)
            .field("signature_image", &self.signature_image.len())
            .field("signed_at", &self.signed_at)
            .finish_non_exhaustive()
    }
}
