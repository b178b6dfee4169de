use serde::{Deserialize, Serialize};

use paraph_blob::BlobMetadata;
use paraph_core::DocumentRef;

/// Pointer from a business document to its stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Storage id in the blob store.
    pub storage_id: String,
    /// Filename the attachment was stored under.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
}

impl From<BlobMetadata> for AttachmentRecord {
    fn from(meta: BlobMetadata) -> Self {
        Self {
            storage_id: meta.storage_id,
            filename: meta.filename,
            content_type: meta.content_type,
        }
    }
}

/// The business document a session signs, as read from the document
/// source-of-truth.
///
/// Only the fields the pipeline needs for rendering are carried here; the
/// full record stays with the external document service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessDocument {
    /// Reference identifying the document.
    pub document: DocumentRef,

    /// Human-facing document number (e.g. `"2024-00017"`).
    pub number: String,

    /// Total amount, for rendering on the document.
    pub total_amount: f64,

    /// ISO currency code.
    pub currency: String,

    /// Current stored attachment, if any.
    pub attachment: Option<AttachmentRecord>,
}

impl BusinessDocument {
    /// Create a document record without an attachment.
    #[must_use]
    pub fn new(
        document: DocumentRef,
        number: impl Into<String>,
        total_amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            document,
            number: number.into(),
            total_amount,
            currency: currency.into(),
            attachment: None,
        }
    }

    /// Attach a stored file record.
    #[must_use]
    pub fn with_attachment(mut self, attachment: AttachmentRecord) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn attachment_from_blob_metadata() {
        let meta = BlobMetadata {
            storage_id: "blob-1".into(),
            filename: "invoice.pdf".into(),
            content_type: "application/pdf".into(),
            size_bytes: 1024,
            created_at: Utc::now(),
        };
        let record = AttachmentRecord::from(meta);
        assert_eq!(record.storage_id, "blob-1");
        assert_eq!(record.content_type, "application/pdf");
    }

    #[test]
    fn document_builder() {
        let doc = BusinessDocument::new(DocumentRef::invoice("inv-1"), "2024-00017", 99.5, "EUR")
            .with_attachment(AttachmentRecord {
                storage_id: "blob-2".into(),
                filename: "inv.pdf".into(),
                content_type: "application/pdf".into(),
            });
        assert_eq!(doc.number, "2024-00017");
        assert!(doc.attachment.is_some());
    }
}
