use thiserror::Error;

use paraph_blob::BlobError;

/// Errors that can occur in the signed-artifact pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The referenced business document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Template rendering failed.
    #[error("render failed: {0}")]
    Render(String),

    /// HTML-to-PDF conversion failed.
    #[error("pdf conversion failed: {0}")]
    PdfConversion(String),

    /// The blob store reported an error.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The document source-of-truth reported an error.
    #[error("document store error: {0}")]
    Backend(String),
}
