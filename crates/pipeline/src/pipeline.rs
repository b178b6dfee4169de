use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use paraph_blob::BlobStore;
use paraph_core::DocumentRef;

use crate::document::AttachmentRecord;
use crate::error::PipelineError;
use crate::ports::{DocumentRenderer, DocumentStore, PdfLayout, RenderVariant};

/// Produces unsigned and signed renditions of business documents.
///
/// The pipeline owns no state of its own; it composes the document
/// source-of-truth, the blob store and the external renderer.
#[derive(Clone)]
pub struct ArtifactPipeline {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    renderer: Arc<dyn DocumentRenderer>,
    layout: PdfLayout,
}

impl fmt::Debug for ArtifactPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactPipeline")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl ArtifactPipeline {
    /// Create a pipeline over the three collaborator ports.
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            documents,
            blobs,
            renderer,
            layout: PdfLayout::default(),
        }
    }

    /// Set the PDF page layout.
    #[must_use]
    pub fn with_layout(mut self, layout: PdfLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Get-or-generate the unsigned PDF for a document.
    ///
    /// Returns the stored attachment's bytes when one exists and can be
    /// retrieved. Otherwise renders a fresh PDF, stores it as the document's
    /// attachment, and returns its bytes. A failed retrieval of an existing
    /// attachment falls back to regeneration instead of failing the call.
    #[instrument(name = "pipeline.unsigned_document", skip(self), fields(document = %document))]
    pub async fn unsigned_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Bytes, PipelineError> {
        let record = self
            .documents
            .fetch(document)
            .await?
            .ok_or_else(|| PipelineError::DocumentNotFound(document.to_string()))?;

        // 1. Try the existing attachment first.
        if let Some(attachment) = &record.attachment {
            match self.blobs.retrieve(&attachment.storage_id).await {
                Ok(Some(bytes)) => {
                    debug!(storage_id = %attachment.storage_id, "using stored attachment");
                    return Ok(bytes);
                }
                Ok(None) => {
                    warn!(storage_id = %attachment.storage_id, "attachment missing, regenerating");
                }
                Err(e) => {
                    warn!(error = %e, storage_id = %attachment.storage_id, "attachment retrieval failed, regenerating");
                }
            }
        }

        // 2. Render a fresh unsigned PDF.
        let html = self
            .renderer
            .render_html(&record, &RenderVariant::Unsigned)
            .await?;
        let pdf = self.renderer.html_to_pdf(&html, self.layout).await?;

        // 3. Store it and point the document at it.
        let filename = format!("{}-{}.pdf", document.kind(), record.number);
        let meta = self
            .blobs
            .store(&filename, "application/pdf", pdf.clone())
            .await?;
        self.documents
            .replace_attachment(document, AttachmentRecord::from(meta))
            .await?;

        debug!(size = pdf.len(), "generated unsigned document");
        Ok(pdf)
    }

    /// Render the signed rendition of a document without touching storage.
    #[instrument(name = "pipeline.render_signed", skip(self, signature), fields(document = %document))]
    pub async fn render_signed(
        &self,
        document: &DocumentRef,
        signature: Bytes,
        signer_name: &str,
    ) -> Result<Bytes, PipelineError> {
        let record = self
            .documents
            .fetch(document)
            .await?
            .ok_or_else(|| PipelineError::DocumentNotFound(document.to_string()))?;

        let variant = RenderVariant::Signed {
            signature,
            signer_name: signer_name.to_owned(),
        };
        let html = self.renderer.render_html(&record, &variant).await?;
        self.renderer.html_to_pdf(&html, self.layout).await
    }

    /// Render the signed rendition and make it the document's stored
    /// attachment, deleting the previous one.
    ///
    /// The delete of the old blob is best-effort: a failure is logged and
    /// the new attachment still replaces the record.
    #[instrument(name = "pipeline.publish_signed", skip(self, signature), fields(document = %document))]
    pub async fn publish_signed(
        &self,
        document: &DocumentRef,
        signature: Bytes,
        signer_name: &str,
    ) -> Result<AttachmentRecord, PipelineError> {
        let record = self
            .documents
            .fetch(document)
            .await?
            .ok_or_else(|| PipelineError::DocumentNotFound(document.to_string()))?;

        let variant = RenderVariant::Signed {
            signature,
            signer_name: signer_name.to_owned(),
        };
        let html = self.renderer.render_html(&record, &variant).await?;
        let pdf = self.renderer.html_to_pdf(&html, self.layout).await?;

        if let Some(old) = &record.attachment {
            match self.blobs.delete(&old.storage_id).await {
                Ok(_) => debug!(storage_id = %old.storage_id, "deleted previous attachment"),
                Err(e) => {
                    warn!(error = %e, storage_id = %old.storage_id, "failed to delete previous attachment");
                }
            }
        }

        let filename = format!("{}-{}-signed.pdf", document.kind(), record.number);
        let meta = self.blobs.store(&filename, "application/pdf", pdf).await?;
        let attachment = AttachmentRecord::from(meta);
        self.documents
            .replace_attachment(document, attachment.clone())
            .await?;

        debug!(storage_id = %attachment.storage_id, "published signed attachment");
        Ok(attachment)
    }
}
