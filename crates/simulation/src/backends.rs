use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use paraph_blob::{BlobError, BlobMetadata, BlobStore};
use paraph_core::{CompanyId, DocumentRef, TabletId};
use paraph_pipeline::{
    AttachmentRecord, BusinessDocument, DocumentRenderer, DocumentStore, PdfLayout, PipelineError,
    RenderVariant,
};
use paraph_transport::{TabletDevice, TabletRegistry, TransportError};

/// Mutable in-memory tablet registry.
#[derive(Debug, Default)]
pub struct SimulatedRegistry {
    devices: RwLock<Vec<TabletDevice>>,
}

impl SimulatedRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device, replacing any previous entry with the same id.
    pub fn upsert(&self, device: TabletDevice) {
        let mut devices = self.devices.write();
        devices.retain(|d| d.tablet_id != device.tablet_id);
        devices.push(device);
    }

    /// Flip a registered device's online flag.
    pub fn set_online(&self, tablet_id: &TabletId, online: bool) {
        let mut devices = self.devices.write();
        if let Some(device) = devices.iter_mut().find(|d| &d.tablet_id == tablet_id) {
            debug!(tablet_id = %tablet_id, online, "device flag flipped");
            device.online = online;
        }
    }
}

#[async_trait]
impl TabletRegistry for SimulatedRegistry {
    async fn find(
        &self,
        tablet_id: &TabletId,
        company_id: &CompanyId,
    ) -> Result<Option<TabletDevice>, TransportError> {
        Ok(self
            .devices
            .read()
            .iter()
            .find(|d| &d.tablet_id == tablet_id && &d.company_id == company_id)
            .cloned())
    }
}

/// Document source-of-truth backed by a map.
#[derive(Debug, Default)]
pub struct SimulatedDocuments {
    documents: Mutex<HashMap<DocumentRef, BusinessDocument>>,
}

impl SimulatedDocuments {
    /// An empty document store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&self, document: BusinessDocument) {
        self.documents
            .lock()
            .insert(document.document.clone(), document);
    }

    /// The attachment currently recorded for a document, if any.
    #[must_use]
    pub fn attachment_of(&self, document: &DocumentRef) -> Option<AttachmentRecord> {
        self.documents
            .lock()
            .get(document)
            .and_then(|d| d.attachment.clone())
    }
}

#[async_trait]
impl DocumentStore for SimulatedDocuments {
    async fn fetch(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<BusinessDocument>, PipelineError> {
        Ok(self.documents.lock().get(document).cloned())
    }

    async fn replace_attachment(
        &self,
        document: &DocumentRef,
        attachment: AttachmentRecord,
    ) -> Result<(), PipelineError> {
        let mut documents = self.documents.lock();
        let record = documents
            .get_mut(document)
            .ok_or_else(|| PipelineError::DocumentNotFound(document.to_string()))?;
        debug!(document = %document, storage_id = %attachment.storage_id, "attachment replaced");
        record.attachment = Some(attachment);
        Ok(())
    }
}

/// Blob store backed by a map.
#[derive(Debug, Default)]
pub struct SimulatedBlobs {
    blobs: Mutex<HashMap<String, (BlobMetadata, Bytes)>>,
    counter: AtomicU64,
}

impl SimulatedBlobs {
    /// An empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob with this storage id exists.
    #[must_use]
    pub fn contains(&self, storage_id: &str) -> bool {
        self.blobs.lock().contains_key(storage_id)
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

#[async_trait]
impl BlobStore for SimulatedBlobs {
    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobMetadata, BlobError> {
        let storage_id = format!("blob-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        debug!(storage_id = %storage_id, filename, bytes = data.len(), "blob stored");
        let metadata = BlobMetadata {
            storage_id: storage_id.clone(),
            filename: filename.to_owned(),
            content_type: content_type.to_owned(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };
        self.blobs
            .lock()
            .insert(storage_id, (metadata.clone(), data));
        Ok(metadata)
    }

    async fn retrieve(&self, storage_id: &str) -> Result<Option<Bytes>, BlobError> {
        Ok(self
            .blobs
            .lock()
            .get(storage_id)
            .map(|(_, data)| data.clone()))
    }

    async fn delete(&self, storage_id: &str) -> Result<bool, BlobError> {
        Ok(self.blobs.lock().remove(storage_id).is_some())
    }
}

/// Renderer producing deterministic placeholder output.
#[derive(Debug, Default)]
pub struct SimulatedRenderer {
    fail_signed: AtomicBool,
}

impl SimulatedRenderer {
    /// A renderer that succeeds for every variant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make renditions of the signed variant fail.
    pub fn fail_signed_renditions(&self, fail: bool) {
        self.fail_signed.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentRenderer for SimulatedRenderer {
    async fn render_html(
        &self,
        document: &BusinessDocument,
        variant: &RenderVariant,
    ) -> Result<String, PipelineError> {
        let label = match variant {
            RenderVariant::Unsigned => "unsigned".to_owned(),
            RenderVariant::Signed { signer_name, .. } => {
                if self.fail_signed.load(Ordering::SeqCst) {
                    debug!(number = %document.number, "failing signed rendition");
                    return Err(PipelineError::Render("simulated renderer outage".into()));
                }
                format!("signed by {signer_name}")
            }
        };
        Ok(format!("<html>{} {label}</html>", document.number))
    }

    async fn html_to_pdf(&self, html: &str, _layout: PdfLayout) -> Result<Bytes, PipelineError> {
        Ok(Bytes::from(format!("%PDF-1.4 {html}")))
    }
}
