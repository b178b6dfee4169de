pub mod document;
pub mod error;
pub mod pipeline;
pub mod ports;

pub use document::{AttachmentRecord, BusinessDocument};
pub use error::PipelineError;
pub use pipeline::ArtifactPipeline;
pub use ports::{DocumentRenderer, DocumentStore, PdfLayout, RenderVariant};
