use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use paraph_core::DocumentRef;

use crate::document::{AttachmentRecord, BusinessDocument};
use crate::error::PipelineError;

/// Page layout passed to the PDF converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfLayout {
    /// A4 portrait, the default for invoices.
    #[default]
    A4Portrait,
    /// A4 landscape.
    A4Landscape,
}

/// Which rendition of a document to produce.
#[derive(Debug, Clone)]
pub enum RenderVariant {
    /// The document as it is pushed to the tablet, without a signature.
    Unsigned,
    /// The document with the received signature stamped into it.
    Signed {
        /// Raw signature image bytes.
        signature: Bytes,
        /// Name of the person who signed.
        signer_name: String,
    },
}

/// Port to the business document source-of-truth.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document record. Returns `None` if unknown.
    async fn fetch(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<BusinessDocument>, PipelineError>;

    /// Point the document record at a new stored attachment.
    async fn replace_attachment(
        &self,
        document: &DocumentRef,
        attachment: AttachmentRecord,
    ) -> Result<(), PipelineError>;
}

/// Port to the external template renderer and PDF generator.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render a document to HTML in the requested variant.
    async fn render_html(
        &self,
        document: &BusinessDocument,
        variant: &RenderVariant,
    ) -> Result<String, PipelineError>;

    /// Convert rendered HTML into PDF bytes.
    async fn html_to_pdf(&self, html: &str, layout: PdfLayout) -> Result<Bytes, PipelineError>;
}
